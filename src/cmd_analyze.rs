// Analyze subcommand: list the file operations of a command.

use bash_scanner_engine as engine;

use crate::output;

pub fn cmd_analyze(command: &str, json_mode: bool) -> miette::Result<()> {
    let result = engine::analyze(command)?;

    if json_mode {
        println!("{}", output::to_json(&result));
    } else {
        output::print_analysis(&result);
    }
    Ok(())
}
