// Shared display helpers for scan and analysis output.

use colored::Colorize;
use serde::Serialize;

use bash_scanner_core::{AnalysisResult, OperationType, ScanResult};

/// Compact JSON for owned, plain-data values.
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("response serialization is infallible")
}

/// Verdict line, then violations with their advice, then safe notes.
pub fn print_scan(result: &ScanResult) {
    if result.allowed {
        println!("{}", "allowed".green().bold());
    } else {
        println!("{}: {}", "denied".red().bold(), result.reason);
    }

    for v in &result.violations {
        println!("  {} {}", "✗".red(), v.message);
        if !v.recommendation.is_empty() {
            println!("    {}", v.recommendation.dimmed());
        }
    }
    for note in &result.safe_operations {
        println!("  {} {}", "✓".green(), note);
    }
    if !result.parse_error.is_empty() {
        println!("  {}", result.parse_error.dimmed());
    }
}

pub fn print_analysis(result: &AnalysisResult) {
    if result.operations.is_empty() {
        println!("{}", "no file operations".dimmed());
    }
    for op in &result.operations {
        let label = format!("{:<6}", op.operation.to_string());
        let label = match op.operation {
            OperationType::Create => label.green(),
            OperationType::Modify => label.yellow(),
            OperationType::Delete => label.red(),
        };
        let mut flags = Vec::new();
        if op.has_glob {
            flags.push("glob");
        }
        if op.has_var {
            flags.push("var");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!(
            "{label} {} {}{}",
            op.path,
            format!("({} line {})", op.command, op.line).dimmed(),
            flags.dimmed()
        );
    }

    if !result.commands.is_empty() {
        println!("\n{}", "Commands".bold());
        for cmd in &result.commands {
            println!("  {cmd}");
        }
    }
    if !result.referenced_paths.is_empty() {
        println!("\n{}", "Referenced paths".bold());
        for path in &result.referenced_paths {
            println!("  {path}");
        }
    }
}
