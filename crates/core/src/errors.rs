// Error types for config loading and hook input.
// The miette Diagnostic derive generates code that triggers unused_assignments
// false positives on struct fields.
#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error from reading a config file or hook payload.
#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("Failed to read {}", path.display())]
    #[diagnostic(code(bash_scanner::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML in {}", path.display())]
    #[diagnostic(
        code(bash_scanner::config::yaml),
        help("expected top-level keys `safe_paths`/`whitelisted_commands` or `categories`")
    )]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{0}")]
    #[diagnostic(code(bash_scanner::hook::input))]
    Input(String),
}
