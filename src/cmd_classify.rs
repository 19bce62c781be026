// Classify subcommand: print the activity category of a command.

use std::path::Path;

use colored::Colorize;

use bash_scanner_config as config;
use bash_scanner_engine::CategoryClassifier;

pub fn cmd_classify(command: &str, json_mode: bool, cwd: &Path) -> miette::Result<()> {
    let classifier = CategoryClassifier::new(config::load_category_config(cwd));
    let category = classifier.classify_bash(command);

    if json_mode {
        let json = serde_json::json!({
            "category": category,
            "priority": category.priority(),
        });
        println!("{json}");
    } else {
        println!("{} (priority {})", category.as_str().bold(), category.priority());
    }
    Ok(())
}
