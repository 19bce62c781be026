// Scan subcommand: judge a command and print the verdict.

use std::path::Path;

use bash_scanner_config as config;
use bash_scanner_core::LoadError;
use bash_scanner_engine::Scanner;

use crate::output;

/// Build a scanner for `cwd` with the safety config discovered from it.
pub fn scanner_for(cwd: &Path, config_path: Option<&Path>) -> Result<Scanner, LoadError> {
    let config = config::load_config(cwd, config_path)?;
    Ok(Scanner::new(cwd, Some(config)))
}

pub fn cmd_scan(
    command: &str,
    json_mode: bool,
    cwd: &Path,
    config_path: Option<&Path>,
) -> miette::Result<()> {
    let result = scanner_for(cwd, config_path)?.scan(command);

    if json_mode {
        println!("{}", output::to_json(&result));
    } else {
        output::print_scan(&result);
    }
    Ok(())
}
