// CLI interface: clap derive with TTY detection

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd_analyze;
mod cmd_classify;
mod cmd_hook;
mod cmd_parse;
mod cmd_scan;
mod output;

/// Environment variable holding the log filter, e.g. `debug` or
/// `bash_scanner_config=debug`.
const LOG_ENV: &str = "BASH_SCANNER_LOG";

#[derive(Parser)]
#[command(name = "bash-scanner", version, about = "Static safety scanner for shell commands")]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Working directory paths are judged against (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Path to config file (overrides $BASH_SCANNER_CONFIG and default locations)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a shell command and report whether it is safe to run
    Scan { command: String },
    /// List the files a shell command creates, modifies or deletes
    Analyze { command: String },
    /// Print the activity category of a shell command
    Classify { command: String },
    /// Parse a shell command and print the AST
    Parse {
        command: Option<String>,
        /// Read command from a file (use `-` for stdin)
        #[arg(short = 'f', long = "file")]
        file: Option<String>,
    },
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .build(),
        )
    }))
    .ok();

    init_logging();

    if let Err(e) = run() {
        eprintln!("{e:?}");
        // Exit code 2 is a blocking error for PreToolUse hooks; stderr is
        // shown to the agent.
        std::process::exit(2);
    }
}

/// Logs go to stderr so hook-mode stdout carries only the JSON response.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main entry point for the CLI.
fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let cwd = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| miette::miette!("Failed to determine current directory: {e}"))?,
    };
    let config = cli.config.as_deref();

    match cli.command {
        Some(Command::Scan { command }) => cmd_scan::cmd_scan(&command, cli.json, &cwd, config)?,
        Some(Command::Analyze { command }) => cmd_analyze::cmd_analyze(&command, cli.json)?,
        Some(Command::Classify { command }) => cmd_classify::cmd_classify(&command, cli.json, &cwd)?,
        Some(Command::Parse { command, file }) => cmd_parse::cmd_parse(command, file)?,
        None => {
            if std::io::stdin().is_terminal() {
                Cli::command()
                    .print_help()
                    .map_err(|e| miette::miette!("Failed to print help: {e}"))?;
                println!();
            } else {
                cmd_hook::cmd_hook(&cwd, config)?;
            }
        }
    }

    Ok(())
}
