// Category classifier: maps commands and agent tool calls to an activity category.

use bash_scanner_core::{Category, CategoryConfig};
use regex::Regex;
use tracing::warn;

use crate::analyze::analyze;

/// Path fragment that marks a file as a plan document.
const PLAN_DIR: &str = "/.claude/plans/";

#[derive(Debug)]
struct CompiledRule {
    category: Category,
    commands: Vec<String>,
    patterns: Vec<Regex>,
    tools: Vec<String>,
}

/// Classifies commands using a [`CategoryConfig`]. Rules are held highest
/// priority first, so overlapping configs resolve deterministically.
#[derive(Debug)]
pub struct CategoryClassifier {
    rules: Vec<CompiledRule>,
}

impl CategoryClassifier {
    pub fn new(config: CategoryConfig) -> Self {
        let mut categories = config.categories;
        let rules = Category::ALL
            .into_iter()
            .filter_map(|category| {
                let rule = categories.remove(&category)?;
                let patterns = rule
                    .patterns
                    .iter()
                    .filter_map(|p| match Regex::new(p) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            warn!(%category, pattern = %p, error = %e, "skipping invalid category pattern");
                            None
                        }
                    })
                    .collect();
                Some(CompiledRule {
                    category,
                    commands: rule.commands,
                    patterns,
                    tools: rule.tools,
                })
            })
            .collect();
        Self { rules }
    }

    /// Classify a single command string. Command prefixes of every category
    /// are tried before any pattern.
    pub fn classify(&self, command: &str) -> Category {
        let cmd = command.trim();
        if cmd.is_empty() {
            return Category::Other;
        }
        let by_command = self.rules.iter().find(|r| {
            r.commands.iter().any(|c| {
                cmd == c || cmd.strip_prefix(c.as_str()).is_some_and(|rest| rest.starts_with(' '))
            })
        });
        let by_pattern = || self.rules.iter().find(|r| r.patterns.iter().any(|re| re.is_match(cmd)));
        by_command
            .or_else(by_pattern)
            .map_or(Category::Other, |r| r.category)
    }

    /// Classify an agent tool by name.
    pub fn classify_tool(&self, tool: &str) -> Category {
        self.rules
            .iter()
            .find(|r| r.tools.iter().any(|t| t == tool))
            .map_or(Category::Other, |r| r.category)
    }

    /// Like [`classify_tool`](Self::classify_tool), but any file under a
    /// `.claude/plans/` directory is a plan.
    pub fn classify_tool_with_path(&self, tool: &str, path: &str) -> Category {
        if path.contains(PLAN_DIR) {
            return Category::Plan;
        }
        self.classify_tool(tool)
    }

    /// Classify a full bash command line. Each invoked command is classified
    /// and the highest-priority category wins; ties keep the first seen.
    /// Falls back to [`classify`](Self::classify) when the line doesn't parse.
    pub fn classify_bash(&self, command: &str) -> Category {
        let commands = match analyze(command) {
            Ok(result) if !result.commands.is_empty() => result.commands,
            _ => return self.classify(command),
        };
        commands
            .iter()
            .map(|c| self.classify(c))
            .fold(Category::Other, |best, cat| {
                if cat.priority() > best.priority() { cat } else { best }
            })
    }
}

/// Priority of a category; higher means more impactful.
pub fn category_priority(category: Category) -> u32 {
    category.priority()
}
