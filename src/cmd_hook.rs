// Hook mode: read a PreToolUse payload from stdin, scan, respond.

use std::io::Read;
use std::path::{Path, PathBuf};

use bash_scanner_core::{HookInput, HookOutput, LoadError};
use tracing::debug;

use crate::cmd_scan::scanner_for;
use crate::output;

/// Largest payload read from stdin.
const MAX_INPUT: u64 = 65536;

pub fn cmd_hook(default_cwd: &Path, config_path: Option<&Path>) -> Result<(), LoadError> {
    let mut input = String::new();
    std::io::stdin()
        .take(MAX_INPUT)
        .read_to_string(&mut input)
        .map_err(|e| LoadError::Input(format!("Failed to read stdin: {e}")))?;

    let payload: HookInput = serde_json::from_str(&input)
        .map_err(|e| LoadError::Input(format!("Invalid JSON: {e}")))?;

    // Only Bash calls are judged; everything else proceeds untouched.
    if payload.tool_name.as_deref() != Some("Bash") {
        println!("{}", output::to_json(&HookOutput::pass()));
        return Ok(());
    }

    let command = payload
        .bash_command()
        .ok_or_else(|| LoadError::Input("Missing tool_input.command".into()))?;

    let cwd = payload
        .cwd
        .as_deref()
        .filter(|c| !c.is_empty())
        .map_or_else(|| default_cwd.to_path_buf(), PathBuf::from);

    let result = scanner_for(&cwd, config_path)?.scan(command);
    debug!(allowed = result.allowed, reason = %result.reason, "scanned hook command");

    println!("{}", output::to_json(&HookOutput::from_scan(&result)));
    Ok(())
}
