// File-operation extraction: which paths a script creates, modifies or deletes.

use bash_scanner_core::{AnalysisResult, FileOperation, OperationType};
use bash_scanner_shell_parser::{
    self as parser, Command, ParseError, Redirection, RedirectionTarget, SimpleCommand, Word,
    WordPart,
};
use tracing::debug;

use crate::words::{contains_glob, contains_var, filter_flags, has_flag, word_value};

/// How a command's arguments map onto file operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOpHandler {
    /// Every non-flag argument is created.
    CreateAll,
    /// Every non-flag argument is deleted.
    DeleteAll,
    /// The last non-flag argument is the destination.
    CopyTo,
    /// First non-flag argument moves to the last.
    Move,
    /// Every non-flag argument after the mode/owner spec is modified.
    ModifyAfterFirst,
    /// Targets are created, or modified in append mode.
    Tee,
    /// Like `ModifyAfterFirst`, but only when editing in place.
    SedInPlace,
}

const HANDLERS: &[(&str, FileOpHandler)] = &[
    ("touch", FileOpHandler::CreateAll),
    ("mkdir", FileOpHandler::CreateAll),
    ("rm", FileOpHandler::DeleteAll),
    ("rmdir", FileOpHandler::DeleteAll),
    ("cp", FileOpHandler::CopyTo),
    ("mv", FileOpHandler::Move),
    ("chmod", FileOpHandler::ModifyAfterFirst),
    ("chown", FileOpHandler::ModifyAfterFirst),
    ("tee", FileOpHandler::Tee),
    ("sed", FileOpHandler::SedInPlace),
];

impl FileOpHandler {
    fn lookup(cmd: &str) -> Option<Self> {
        HANDLERS.iter().find(|(name, _)| *name == cmd).map(|(_, h)| *h)
    }

    /// The words this handler touches, with the operation applied to each.
    fn targets(self, args: &[Word]) -> Vec<(&Word, OperationType)> {
        use OperationType::*;

        let paths = filter_flags(args);
        let all = |op: OperationType| paths.iter().map(|w| (*w, op)).collect::<Vec<_>>();
        let after_first =
            |op: OperationType| paths.iter().skip(1).map(|w| (*w, op)).collect::<Vec<_>>();

        match self {
            FileOpHandler::CreateAll => all(Create),
            FileOpHandler::DeleteAll => all(Delete),
            FileOpHandler::CopyTo => match paths.as_slice() {
                [_, .., dest] => vec![(*dest, Create)],
                _ => vec![],
            },
            FileOpHandler::Move => match paths.as_slice() {
                [src, .., dest] => vec![(*src, Delete), (*dest, Create)],
                _ => vec![],
            },
            FileOpHandler::ModifyAfterFirst => after_first(Modify),
            FileOpHandler::Tee => {
                if has_flag(args, |a| a == "-a" || a == "--append") {
                    all(Modify)
                } else {
                    all(Create)
                }
            }
            FileOpHandler::SedInPlace => {
                if has_flag(args, is_in_place_flag) {
                    after_first(Modify)
                } else {
                    vec![]
                }
            }
        }
    }
}

fn is_in_place_flag(arg: &str) -> bool {
    arg.starts_with("-i") || arg == "--in-place" || arg.starts_with("--in-place=")
}

/// Maximum nesting of command substitutions that are analyzed.
const MAX_SUBSTITUTION_DEPTH: usize = 16;

/// Parse a script and collect its file operations, invoked commands and
/// referenced paths.
///
/// Bodies of `$(...)`, backticks and process substitutions are analyzed too,
/// after the command that contains them. Their lines count from the line of
/// the word holding the substitution.
pub fn analyze(script: &str) -> Result<AnalysisResult, ParseError> {
    let ast = parser::parse(script)?;
    let mut analyzer = Analyzer::default();
    analyzer.walk(&ast);
    Ok(analyzer.result)
}

#[derive(Default)]
struct Analyzer {
    result: AnalysisResult,
    depth: usize,
    /// Lines above the script being walked, for substitution bodies.
    line_base: usize,
}

impl Analyzer {
    fn walk(&mut self, cmd: &Command) {
        match cmd {
            Command::Simple(sc) => {
                self.redirects(&sc.redirections);
                self.call(sc);
                for a in &sc.assignments {
                    self.substitutions(&a.value, a.line);
                }
                for word in &sc.words {
                    self.substitutions(word, sc.line);
                }
                self.redirect_substitutions(&sc.redirections);
            }
            Command::Assignment(a) => self.substitutions(&a.value, a.line),
            Command::For { words, line, .. } | Command::Select { words, line, .. } => {
                for word in words {
                    self.substitutions(word, *line);
                }
            }
            Command::Case { word, line, .. } => self.substitutions(word, *line),
            Command::Redirected { redirections, .. } => {
                self.redirects(redirections);
                self.redirect_substitutions(redirections);
            }
            _ => {}
        }
        for child in cmd.children() {
            self.walk(child);
        }
    }

    fn redirect_substitutions(&mut self, redirections: &[Redirection]) {
        for redir in redirections {
            if let RedirectionTarget::File(word) = &redir.target {
                self.substitutions(word, redir.line);
            }
        }
    }

    fn substitutions(&mut self, word: &Word, line: usize) {
        for body in substitution_bodies(&word.parts) {
            self.nested(body, line);
        }
    }

    fn nested(&mut self, script: &str, line: usize) {
        if self.depth >= MAX_SUBSTITUTION_DEPTH {
            debug!(depth = self.depth, "command substitution nesting too deep");
            return;
        }
        let Ok(ast) = parser::parse(script) else {
            debug!(script, "skipping unparseable command substitution");
            return;
        };
        let saved = self.line_base;
        self.line_base += line.saturating_sub(1);
        self.depth += 1;
        self.walk(&ast);
        self.depth -= 1;
        self.line_base = saved;
    }

    fn redirects(&mut self, redirections: &[Redirection]) {
        for redir in redirections {
            let RedirectionTarget::File(word) = &redir.target else {
                continue;
            };
            if !redir.kind.is_write() || word_value(word).is_empty() {
                continue;
            }
            let (operation, tag) = if redir.kind.is_append() {
                (OperationType::Modify, ">>")
            } else {
                (OperationType::Create, ">")
            };
            self.push(word, operation, tag, redir.line);
        }
    }

    fn call(&mut self, sc: &SimpleCommand) {
        let Some(name) = sc.command_name() else {
            return;
        };
        let args = sc.args();

        if let Some(handler) = FileOpHandler::lookup(&name) {
            for (word, operation) in handler.targets(args) {
                self.push(word, operation, &name, sc.line);
            }
        }

        let values: Vec<String> = args.iter().map(word_value).collect();
        self.result.commands.push(
            std::iter::once(name.as_str())
                .chain(values.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" "),
        );

        if name == "cd" {
            if let Some(target) = values.into_iter().next() {
                self.result.referenced_paths.push(target);
            }
            return;
        }
        self.result.referenced_paths.extend(
            values
                .into_iter()
                .filter(|v| v.starts_with('/') && !v.starts_with("/dev/")),
        );
    }

    fn push(&mut self, word: &Word, operation: OperationType, command: &str, line: usize) {
        let path = word_value(word);
        self.result.operations.push(FileOperation {
            has_glob: contains_glob(&path),
            has_var: contains_var(word),
            path,
            operation,
            command: command.to_string(),
            line: self.line_base + line,
        });
    }
}

/// Script text of every command substitution in a word, quoted or not.
fn substitution_bodies(parts: &[WordPart]) -> Vec<&str> {
    let mut bodies = Vec::new();
    for part in parts {
        match part {
            WordPart::CommandSubstitution(body)
            | WordPart::Backtick(body)
            | WordPart::ProcessSubstitution { command: body, .. } => bodies.push(body.as_str()),
            WordPart::DoubleQuoted(inner) => bodies.extend(substitution_bodies(inner)),
            _ => {}
        }
    }
    bodies
}
