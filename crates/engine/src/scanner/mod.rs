// Safety scanner: walks a parsed command and reports violations.

mod cascade;


use std::path::{Path, PathBuf};

use bash_scanner_core::{Config, FileOperation, ScanResult, Violation};
use bash_scanner_shell_parser::{self as parser, Command, Redirection, RedirectionTarget, SimpleCommand};
use tracing::debug;

use crate::analyze::analyze;
use crate::classifier::PathClassifier;
use crate::words::word_value;
use cascade::{CASCADE, Call, Finding, RuleContext, RuleOutcome, classify_write};

const PARSE_FAILURE: &str = "Failed to parse bash command";

/// Maximum nesting of heredoc scripts that are scanned as commands.
const MAX_HEREDOC_DEPTH: usize = 8;

/// Substrings that mark a heredoc body as shell script rather than data.
const SCRIPT_MARKERS: &[&str] = &[
    "if ", "then", "else", "fi", "for ", "while ", "do", "done", "case ", "esac", "function ",
    "echo ", "cat ", "grep ", "awk ", "sed ", "cd ", "ls ", "rm ", "cp ", "mv ",
];

/// Decides whether shell commands are safe to run in a working directory.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: Config,
    classifier: PathClassifier,
}

impl Scanner {
    pub fn new(cwd: impl AsRef<Path>, config: Option<Config>) -> Self {
        let config = config.unwrap_or_default();
        let classifier = PathClassifier::new(cwd, Some(&config));
        Self { config, classifier }
    }

    /// Override the home directory used for path classification.
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.classifier = self.classifier.with_home_dir(home);
        self
    }

    /// Scan a command string. Never fails: malformed input yields a
    /// disallowed result carrying the parse error.
    pub fn scan(&self, command: &str) -> ScanResult {
        self.scan_at_depth(command, 0)
    }

    fn scan_at_depth(&self, command: &str, depth: usize) -> ScanResult {
        let ast = match parser::parse(command) {
            Ok(ast) => ast,
            Err(e) => {
                return ScanResult {
                    allowed: false,
                    reason: PARSE_FAILURE.to_string(),
                    violations: vec![Violation {
                        message: format!("{PARSE_FAILURE}: {e}"),
                        command: command.to_string(),
                        path: String::new(),
                        recommendation: String::new(),
                    }],
                    parse_error: e.to_string(),
                    ..Default::default()
                };
            }
        };

        let mut walk = Walk {
            scanner: self,
            depth,
            violations: Vec::new(),
            safe_operations: Vec::new(),
        };
        walk.command(&ast);

        let operations = analyze(command).map(|a| a.operations).unwrap_or_default();
        walk.finish(operations)
    }

    fn context(&self) -> RuleContext<'_> {
        RuleContext {
            config: &self.config,
            classifier: &self.classifier,
        }
    }
}

/// Accumulates the findings of one scan.
struct Walk<'a> {
    scanner: &'a Scanner,
    depth: usize,
    violations: Vec<Violation>,
    safe_operations: Vec<String>,
}

impl Walk<'_> {
    fn command(&mut self, cmd: &Command) {
        match cmd {
            Command::Simple(sc) => {
                self.simple(sc);
                self.redirects(&sc.redirections);
            }
            Command::Pipeline(cmds) | Command::Sequence(cmds) => {
                for c in cmds {
                    self.command(c);
                }
            }
            Command::And(a, b) | Command::Or(a, b) => {
                self.command(a);
                self.command(b);
            }
            Command::Background(c) | Command::Subshell(c) | Command::BraceGroup(c) => {
                self.command(c);
            }
            Command::If { condition, then_branch, elif_branches, else_branch } => {
                self.command(condition);
                self.command(then_branch);
                for (cond, body) in elif_branches {
                    self.command(cond);
                    self.command(body);
                }
                if let Some(body) = else_branch {
                    self.command(body);
                }
            }
            Command::For { body, .. }
            | Command::ArithFor { body, .. }
            | Command::Select { body, .. }
            | Command::Coproc { body, .. }
            | Command::FunctionDef { body, .. } => self.command(body),
            Command::While { condition, body } | Command::Until { condition, body } => {
                self.command(condition);
                self.command(body);
            }
            Command::Case { arms, .. } => {
                for body in arms.iter().filter_map(|arm| arm.body.as_ref()) {
                    self.command(body);
                }
            }
            Command::Redirected { command, redirections } => {
                self.command(command);
                self.redirects(redirections);
            }
            Command::Assignment(_) => {}
        }
    }

    fn simple(&mut self, sc: &SimpleCommand) {
        let Some(name) = sc.command_name() else {
            return;
        };
        let call = Call {
            name,
            args: sc.args().iter().map(word_value).collect(),
        };
        let ctx = self.scanner.context();
        for rule in CASCADE {
            if let RuleOutcome::Verdict(findings) = rule.check(&ctx, &call) {
                self.record(findings);
                return;
            }
        }
    }

    fn redirects(&mut self, redirections: &[Redirection]) {
        for redir in redirections {
            match &redir.target {
                RedirectionTarget::Heredoc(body) => self.heredoc(body),
                RedirectionTarget::File(word) if redir.kind.is_write() => {
                    let path = word_value(word);
                    let finding = classify_write(&self.scanner.classifier, "redirect", &path);
                    self.record(vec![finding]);
                }
                _ => {}
            }
        }
    }

    fn heredoc(&mut self, body: &str) {
        if !looks_like_script(body) {
            self.safe_operations.push("heredoc (data)".into());
            return;
        }
        if self.depth >= MAX_HEREDOC_DEPTH {
            debug!(depth = self.depth, "heredoc nesting too deep");
            self.violations.push(Violation {
                message: format!("Heredoc scripts nested more than {MAX_HEREDOC_DEPTH} levels deep"),
                command: "heredoc".into(),
                path: String::new(),
                recommendation: "Write the script to a file and review it before running it."
                    .into(),
            });
            return;
        }

        debug!(depth = self.depth + 1, "scanning heredoc script");
        let nested = self.scanner.scan_at_depth(body, self.depth + 1);
        self.violations.extend(nested.violations.into_iter().map(|mut v| {
            v.message = format!("In heredoc script: {}", v.message);
            v
        }));
        self.safe_operations
            .extend(nested.safe_operations.into_iter().map(|op| format!("heredoc: {op}")));
    }

    fn record(&mut self, findings: Vec<Finding>) {
        for finding in findings {
            match finding {
                Finding::Safe(note) => self.safe_operations.push(note),
                Finding::Violation(v) => self.violations.push(v),
            }
        }
    }

    fn finish(self, operations: Vec<FileOperation>) -> ScanResult {
        ScanResult {
            allowed: self.violations.is_empty(),
            reason: self.violations.first().map(|v| v.message.clone()).unwrap_or_default(),
            violations: self.violations,
            operations,
            safe_operations: self.safe_operations,
            parse_error: String::new(),
        }
    }
}

fn looks_like_script(content: &str) -> bool {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.starts_with("#!") || SCRIPT_MARKERS.iter().any(|m| trimmed.contains(m))
}
