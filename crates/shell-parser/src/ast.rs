/// A complete parsed shell command (may contain compound structures).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Simple(SimpleCommand),
    Pipeline(Vec<Command>),
    And(Box<Command>, Box<Command>),
    Or(Box<Command>, Box<Command>),
    Sequence(Vec<Command>),
    Background(Box<Command>),
    Subshell(Box<Command>),
    BraceGroup(Box<Command>),
    If {
        condition: Box<Command>,
        then_branch: Box<Command>,
        elif_branches: Vec<(Command, Command)>,
        else_branch: Option<Box<Command>>,
    },
    For {
        var: String,
        words: Vec<Word>,
        body: Box<Command>,
        line: usize,
    },
    /// `for ((init; cond; step))`, header kept verbatim.
    ArithFor {
        header: String,
        body: Box<Command>,
    },
    Select {
        var: String,
        words: Vec<Word>,
        body: Box<Command>,
        line: usize,
    },
    While {
        condition: Box<Command>,
        body: Box<Command>,
    },
    Until {
        condition: Box<Command>,
        body: Box<Command>,
    },
    Case {
        word: Word,
        arms: Vec<CaseArm>,
        /// 1-based line of the `case` keyword.
        line: usize,
    },
    FunctionDef {
        name: String,
        body: Box<Command>,
    },
    Coproc {
        name: Option<String>,
        body: Box<Command>,
    },
    Redirected {
        command: Box<Command>,
        redirections: Vec<Redirection>,
    },
    Assignment(Assignment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub patterns: Vec<Word>,
    pub body: Option<Command>,
    pub terminator: CaseTerminator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseTerminator {
    Break,       // ;;
    Fallthrough, // ;&
    Continue,    // ;;&
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCommand {
    pub assignments: Vec<Assignment>,
    pub words: Vec<Word>,
    pub redirections: Vec<Redirection>,
    /// 1-based line of the first token of the command.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Word,
    /// 1-based line of the assignment word.
    pub line: usize,
}

/// A word is a sequence of word parts that get concatenated.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub parts: Vec<WordPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WordPart {
    Literal(String),
    SingleQuoted(String),
    DoubleQuoted(Vec<WordPart>),
    AnsiCQuoted(String),
    Parameter(String),
    ParameterExpansion(String),
    ParameterExpansionOp { name: String, op: ParameterOperator },
    CommandSubstitution(String),
    Backtick(String),
    Arithmetic(String),
    BraceExpansion(Vec<String>),
    Glob(String),
    ProcessSubstitution { direction: ProcessDirection, command: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessDirection {
    Input,  // <(cmd)
    Output, // >(cmd)
}

/// Structured representation of parameter expansion operators.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterOperator {
    Length,                                                      // ${#VAR}
    StripPrefix { longest: bool, pattern: String },              // ${VAR#pat} / ${VAR##pat}
    StripSuffix { longest: bool, pattern: String },              // ${VAR%pat} / ${VAR%%pat}
    Replace { all: bool, pattern: String, replacement: String }, // ${VAR/pat/rep} / ${VAR//pat/rep}
    Default { colon: bool, value: String },                      // ${VAR:-val} / ${VAR-val}
    Alternative { colon: bool, value: String },                  // ${VAR:+val} / ${VAR+val}
    Error { colon: bool, message: String },                      // ${VAR:?msg} / ${VAR?msg}
    Assign { colon: bool, value: String },                       // ${VAR:=val} / ${VAR=val}
    Substring { offset: String, length: Option<String> },        // ${VAR:n} / ${VAR:n:m}
    Uppercase { all: bool },                                     // ${VAR^} / ${VAR^^}
    Lowercase { all: bool },                                     // ${VAR,} / ${VAR,,}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Redirection {
    pub fd: Option<i32>,
    pub kind: RedirectionKind,
    pub target: RedirectionTarget,
    /// 1-based line of the redirect operator.
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectionKind {
    Input,        // <
    Output,       // >
    Append,       // >>
    Clobber,      // >|
    OutputAll,    // &>
    AppendAll,    // &>>
    DupInput,     // <&
    DupOutput,    // >&
    Heredoc,      // <<
    HeredocStrip, // <<-
    Herestring,   // <<<
}

impl RedirectionKind {
    /// True for operators that write to their target file.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            RedirectionKind::Output
                | RedirectionKind::Append
                | RedirectionKind::Clobber
                | RedirectionKind::OutputAll
                | RedirectionKind::AppendAll
        )
    }

    /// True for operators that append rather than truncate.
    pub fn is_append(self) -> bool {
        matches!(self, RedirectionKind::Append | RedirectionKind::AppendAll)
    }

    /// Shell spelling of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectionKind::Input => "<",
            RedirectionKind::Output => ">",
            RedirectionKind::Append => ">>",
            RedirectionKind::Clobber => ">|",
            RedirectionKind::OutputAll => "&>",
            RedirectionKind::AppendAll => "&>>",
            RedirectionKind::DupInput => "<&",
            RedirectionKind::DupOutput => ">&",
            RedirectionKind::Heredoc => "<<",
            RedirectionKind::HeredocStrip => "<<-",
            RedirectionKind::Herestring => "<<<",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedirectionTarget {
    File(Word),
    Fd(i32),
    Heredoc(String),
}

/// Format a parameter expansion operator back to shell syntax (without `${` and `}`).
pub(crate) fn format_param_op(name: &str, op: &ParameterOperator) -> String {
    match op {
        ParameterOperator::Length => format!("#{name}"),
        ParameterOperator::StripPrefix { longest, pattern } => {
            if *longest { format!("{name}##{pattern}") } else { format!("{name}#{pattern}") }
        }
        ParameterOperator::StripSuffix { longest, pattern } => {
            if *longest { format!("{name}%%{pattern}") } else { format!("{name}%{pattern}") }
        }
        ParameterOperator::Replace { all, pattern, replacement } => {
            if *all {
                format!("{name}//{pattern}/{replacement}")
            } else {
                format!("{name}/{pattern}/{replacement}")
            }
        }
        ParameterOperator::Default { colon, value } => {
            if *colon { format!("{name}:-{value}") } else { format!("{name}-{value}") }
        }
        ParameterOperator::Alternative { colon, value } => {
            if *colon { format!("{name}:+{value}") } else { format!("{name}+{value}") }
        }
        ParameterOperator::Error { colon, message } => {
            if *colon { format!("{name}:?{message}") } else { format!("{name}?{message}") }
        }
        ParameterOperator::Assign { colon, value } => {
            if *colon { format!("{name}:={value}") } else { format!("{name}={value}") }
        }
        ParameterOperator::Substring { offset, length } => match length {
            Some(len) => format!("{name}:{offset}:{len}"),
            None => format!("{name}:{offset}"),
        },
        ParameterOperator::Uppercase { all } => {
            if *all { format!("{name}^^") } else { format!("{name}^") }
        }
        ParameterOperator::Lowercase { all } => {
            if *all { format!("{name},,") } else { format!("{name},") }
        }
    }
}

/// Returns true if any part in the slice is an expansion whose runtime value
/// is unknown to static analysis.
fn has_expansion_in(parts: &[WordPart]) -> bool {
    parts.iter().any(|part| match part {
        WordPart::CommandSubstitution(_)
        | WordPart::Backtick(_)
        | WordPart::Parameter(_)
        | WordPart::ParameterExpansion(_)
        | WordPart::ParameterExpansionOp { .. }
        | WordPart::Arithmetic(_) => true,
        WordPart::DoubleQuoted(inner) => has_expansion_in(inner),
        _ => false,
    })
}

/// Render a slice of word parts back to shell-like text. Quoting is dropped,
/// expansions keep their sigils so aliases like `$HOME` stay recognisable.
fn parts_to_str(parts: &[WordPart], out: &mut String) {
    for part in parts {
        match part {
            WordPart::Literal(s)
            | WordPart::SingleQuoted(s)
            | WordPart::AnsiCQuoted(s)
            | WordPart::Glob(s) => out.push_str(s),
            WordPart::Parameter(name) | WordPart::ParameterExpansion(name) => {
                out.push('$');
                out.push_str(name);
            }
            WordPart::ParameterExpansionOp { name, op } => {
                out.push_str("${");
                out.push_str(&format_param_op(name, op));
                out.push('}');
            }
            WordPart::CommandSubstitution(cmd) => {
                out.push_str("$(");
                out.push_str(cmd);
                out.push(')');
            }
            WordPart::Backtick(cmd) => {
                out.push('`');
                out.push_str(cmd);
                out.push('`');
            }
            WordPart::Arithmetic(expr) => {
                out.push_str("$((");
                out.push_str(expr);
                out.push_str("))");
            }
            WordPart::DoubleQuoted(inner) => parts_to_str(inner, out),
            WordPart::BraceExpansion(items) => {
                out.push('{');
                out.push_str(&items.join(","));
                out.push('}');
            }
            WordPart::ProcessSubstitution { direction, command } => {
                out.push(match direction {
                    ProcessDirection::Input => '<',
                    ProcessDirection::Output => '>',
                });
                out.push('(');
                out.push_str(command);
                out.push(')');
            }
        }
    }
}

impl Word {
    pub fn literal(s: &str) -> Self {
        Word {
            parts: vec![WordPart::Literal(s.to_string())],
        }
    }

    /// Returns true if this word contains a parameter expansion, command
    /// substitution or arithmetic expansion, including inside double quotes.
    pub fn has_expansion(&self) -> bool {
        has_expansion_in(&self.parts)
    }

    /// Flatten this word to a plain string.
    pub fn to_str(&self) -> String {
        let mut out = String::new();
        parts_to_str(&self.parts, &mut out);
        out
    }

    /// Returns true if all parts are static (no expansions of any kind).
    pub fn is_literal(&self) -> bool {
        self.parts.iter().all(|p| {
            matches!(
                p,
                WordPart::Literal(_) | WordPart::SingleQuoted(_) | WordPart::AnsiCQuoted(_)
            )
        })
    }
}

impl Command {
    /// Returns all direct child commands of this node.
    pub fn children(&self) -> Vec<&Command> {
        match self {
            Command::Simple(_) | Command::Assignment(_) => vec![],
            Command::Pipeline(cmds) | Command::Sequence(cmds) => cmds.iter().collect(),
            Command::And(a, b) | Command::Or(a, b) => vec![a, b],
            Command::Background(c) | Command::Subshell(c) | Command::BraceGroup(c) => vec![c],
            Command::If { condition, then_branch, elif_branches, else_branch } => {
                let mut children = vec![condition.as_ref(), then_branch.as_ref()];
                for (cond, body) in elif_branches {
                    children.push(cond);
                    children.push(body);
                }
                if let Some(eb) = else_branch {
                    children.push(eb);
                }
                children
            }
            Command::For { body, .. }
            | Command::ArithFor { body, .. }
            | Command::Select { body, .. }
            | Command::Coproc { body, .. } => vec![body],
            Command::While { condition, body } | Command::Until { condition, body } => {
                vec![condition, body]
            }
            Command::Case { arms, .. } => {
                arms.iter().filter_map(|arm| arm.body.as_ref()).collect()
            }
            Command::FunctionDef { body, .. } => vec![body],
            Command::Redirected { command, .. } => vec![command],
        }
    }
}

impl SimpleCommand {
    /// The flattened command name (first word), if any.
    pub fn command_name(&self) -> Option<String> {
        self.words.first().map(Word::to_str)
    }

    /// The arguments (all words after the first).
    pub fn args(&self) -> &[Word] {
        if self.words.len() > 1 {
            &self.words[1..]
        } else {
            &[]
        }
    }
}
