// Parse subcommand: parse a shell command and print the AST.

use std::io::Read;

use bash_scanner_shell_parser as parser;

pub fn cmd_parse(command: Option<String>, file: Option<String>) -> miette::Result<()> {
    let input = match (file, command) {
        (Some(path), _) if path == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| miette::miette!("Failed to read stdin: {e}"))?;
            buf
        }
        (Some(path), _) => std::fs::read_to_string(&path)
            .map_err(|e| miette::miette!("Failed to read {path}: {e}"))?,
        (None, Some(cmd)) => cmd,
        (None, None) => {
            return Err(miette::miette!(
                "Usage: bash-scanner parse '<command>' or bash-scanner parse -f <file>"
            ));
        }
    };

    let ast = parser::parse(&input)?;
    println!("{ast:#?}");
    Ok(())
}
