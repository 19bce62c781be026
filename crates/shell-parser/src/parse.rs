use super::ast::*;
use super::error::SyntaxError;
use super::lexer::{Lexeme, Lexer, Token};

type ParseResult<T> = Result<T, SyntaxError>;

/// Deepest nesting of compound commands accepted.
pub(super) const MAX_NESTING: usize = 256;

pub(super) struct Parser {
    tokens: Vec<Lexeme>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(super) fn new(input: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser { tokens, pos: 0, depth: 0 })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map_or(&Token::Eof, |l| &l.token)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).map_or(&Token::Eof, |l| &l.token)
    }

    /// Byte offset of the current token.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or(0, |l| l.offset)
    }

    /// Line of the current token.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map_or(1, |l| l.line)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn expect(&mut self, expected: &Token, context: &str) -> ParseResult<()> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(SyntaxError::new(
                format!(
                    "{context} must be followed by {}, found {}",
                    expected.describe(),
                    self.peek().describe()
                ),
                self.offset(),
            ))
        }
    }

    /// Error for a token that cannot start a command here.
    fn unexpected(&self) -> SyntaxError {
        let tok = self.peek();
        let message = match tok {
            Token::Eof => "unexpected end of input".to_string(),
            Token::Pipe
            | Token::And
            | Token::Or
            | Token::Semi
            | Token::Amp
            | Token::DoubleSemi
            | Token::SemiAmp
            | Token::DoubleSemiAmp => format!("{} can only follow a command", tok.describe()),
            _ => format!("unexpected {}", tok.describe()),
        };
        SyntaxError::new(message, self.offset())
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    pub(super) fn parse_complete(&mut self) -> ParseResult<Command> {
        self.skip_newlines();
        if self.at_eof() {
            return Ok(Command::Simple(SimpleCommand {
                assignments: vec![],
                words: vec![],
                redirections: vec![],
                line: 1,
            }));
        }
        let cmd = self.parse_list()?;
        self.skip_newlines();
        if !self.at_eof() {
            return Err(self.unexpected());
        }
        Ok(cmd)
    }

    fn parse_list(&mut self) -> ParseResult<Command> {
        let mut commands = vec![self.parse_and_or()?];

        loop {
            match self.peek() {
                Token::Semi | Token::Newline => {
                    self.advance();
                }
                Token::Amp => {
                    self.advance();
                    if let Some(last) = commands.pop() {
                        commands.push(Command::Background(Box::new(last)));
                    }
                }
                _ => break,
            }
            self.skip_newlines();
            if self.is_list_terminator() {
                break;
            }
            commands.push(self.parse_and_or()?);
        }

        Ok(if commands.len() == 1 {
            commands.remove(0)
        } else {
            Command::Sequence(commands)
        })
    }

    fn is_list_terminator(&self) -> bool {
        matches!(
            self.peek(),
            Token::Eof
                | Token::RParen
                | Token::RBrace
                | Token::Fi
                | Token::Done
                | Token::Esac
                | Token::Else
                | Token::Elif
                | Token::Then
                | Token::Do
                | Token::DoubleSemi
                | Token::SemiAmp
                | Token::DoubleSemiAmp
        )
    }

    /// After a binary operator, require a command on its right.
    fn require_operand(&mut self, op: &str, op_offset: usize) -> ParseResult<()> {
        self.skip_newlines();
        if self.at_eof() {
            return Err(SyntaxError::new(
                format!("`{op}` must be followed by a command"),
                op_offset,
            ));
        }
        Ok(())
    }

    fn parse_and_or(&mut self) -> ParseResult<Command> {
        let mut left = self.parse_pipeline()?;

        loop {
            let op_offset = self.offset();
            match self.peek() {
                Token::And => {
                    self.advance();
                    self.require_operand("&&", op_offset)?;
                    let right = self.parse_pipeline()?;
                    left = Command::And(Box::new(left), Box::new(right));
                }
                Token::Or => {
                    self.advance();
                    self.require_operand("||", op_offset)?;
                    let right = self.parse_pipeline()?;
                    left = Command::Or(Box::new(left), Box::new(right));
                }
                _ => break,
            }
        }

        Ok(left)
    }

    fn parse_pipeline(&mut self) -> ParseResult<Command> {
        // `!` negates the exit status only
        if let Token::Word(w) = self.peek()
            && w.is_literal()
            && w.to_str() == "!"
        {
            self.advance();
        }

        let mut commands = vec![self.parse_command()?];

        while matches!(self.peek(), Token::Pipe) {
            let op_offset = self.offset();
            self.advance();
            self.require_operand("|", op_offset)?;
            commands.push(self.parse_command()?);
        }

        Ok(if commands.len() == 1 {
            commands.remove(0)
        } else {
            Command::Pipeline(commands)
        })
    }

    fn parse_command(&mut self) -> ParseResult<Command> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::new(
                format!("commands nested more than {MAX_NESTING} levels deep"),
                self.offset(),
            ));
        }
        self.depth += 1;
        let result = self.parse_command_inner();
        self.depth -= 1;
        result
    }

    fn parse_command_inner(&mut self) -> ParseResult<Command> {
        let cmd = match self.peek() {
            Token::If => self.parse_if()?,
            Token::For => self.parse_for()?,
            Token::Select => self.parse_select()?,
            Token::Coproc => self.parse_coproc()?,
            Token::While => self.parse_while()?,
            Token::Until => self.parse_until()?,
            Token::Case => self.parse_case()?,
            Token::Function => self.parse_function_def()?,
            Token::LParen => self.parse_subshell()?,
            Token::LBrace => self.parse_brace_group()?,
            _ => return self.parse_simple_command(),
        };
        Ok(self.maybe_wrap_redirections(cmd))
    }

    fn maybe_wrap_redirections(&mut self, cmd: Command) -> Command {
        let mut redirections = Vec::new();
        while let Token::Redirect(r) = self.peek() {
            redirections.push(r.clone());
            self.advance();
        }
        if redirections.is_empty() {
            cmd
        } else {
            Command::Redirected {
                command: Box::new(cmd),
                redirections,
            }
        }
    }

    fn parse_simple_command(&mut self) -> ParseResult<Command> {
        let line = self.line();
        let mut assignments = Vec::new();
        let mut words = Vec::new();
        let mut redirections = Vec::new();

        loop {
            match self.peek() {
                Token::Word(w) => {
                    // Check for assignment (VAR=value) before any command words
                    if words.is_empty()
                        && let Some(assignment) = as_assignment(w, self.line())
                    {
                        self.advance();
                        assignments.push(assignment);
                        continue;
                    }
                    let word = w.clone();
                    self.advance();

                    // POSIX function definition: name() { body }
                    if words.is_empty()
                        && assignments.is_empty()
                        && matches!(self.peek(), Token::LParen)
                        && matches!(self.peek_at(1), Token::RParen)
                    {
                        self.advance(); // skip LParen
                        self.advance(); // skip RParen
                        self.skip_newlines();
                        let body = self.parse_command()?;
                        return Ok(Command::FunctionDef {
                            name: word.to_str(),
                            body: Box::new(body),
                        });
                    }
                    words.push(word);
                }
                Token::Redirect(r) => {
                    redirections.push(r.clone());
                    self.advance();
                }
                _ => break,
            }
        }

        if assignments.is_empty() && words.is_empty() && redirections.is_empty() {
            return Err(self.unexpected());
        }

        // A lone assignment is its own node
        if words.is_empty() && redirections.is_empty() && assignments.len() == 1 {
            return Ok(Command::Assignment(assignments.remove(0)));
        }

        Ok(Command::Simple(SimpleCommand {
            assignments,
            words,
            redirections,
            line,
        }))
    }

    fn parse_if(&mut self) -> ParseResult<Command> {
        self.advance(); // skip 'if'
        self.skip_newlines();
        let condition = self.parse_list()?;
        self.skip_newlines();
        self.expect(&Token::Then, "`if` condition")?;
        self.skip_newlines();
        let then_branch = self.parse_list()?;

        let mut elif_branches = Vec::new();
        let mut else_branch = None;

        loop {
            self.skip_newlines();
            match self.peek() {
                Token::Elif => {
                    self.advance();
                    self.skip_newlines();
                    let cond = self.parse_list()?;
                    self.skip_newlines();
                    self.expect(&Token::Then, "`elif` condition")?;
                    self.skip_newlines();
                    let body = self.parse_list()?;
                    elif_branches.push((cond, body));
                }
                Token::Else => {
                    self.advance();
                    self.skip_newlines();
                    else_branch = Some(Box::new(self.parse_list()?));
                    break;
                }
                _ => break,
            }
        }

        self.skip_newlines();
        self.expect(&Token::Fi, "`if` statement")?;

        Ok(Command::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            elif_branches,
            else_branch,
        })
    }

    fn parse_for(&mut self) -> ParseResult<Command> {
        let line = self.line();
        self.advance(); // skip 'for'
        self.skip_newlines();

        if let Token::Arithmetic(header) = self.peek() {
            let header = header.clone();
            self.advance();
            self.skip_separator();
            let body = self.parse_do_group("`for ((...))` header")?;
            return Ok(Command::ArithFor {
                header,
                body: Box::new(body),
            });
        }

        let (var, words) = self.parse_name_and_words("for")?;
        let body = self.parse_do_group("`for` loop")?;

        Ok(Command::For {
            var,
            words,
            body: Box::new(body),
            line,
        })
    }

    fn parse_select(&mut self) -> ParseResult<Command> {
        let line = self.line();
        self.advance(); // skip 'select'
        self.skip_newlines();

        let (var, words) = self.parse_name_and_words("select")?;
        let body = self.parse_do_group("`select` list")?;

        Ok(Command::Select {
            var,
            words,
            body: Box::new(body),
            line,
        })
    }

    /// `NAME [in WORD...]` and the separator before `do`.
    fn parse_name_and_words(&mut self, keyword: &str) -> ParseResult<(String, Vec<Word>)> {
        let var = match self.advance() {
            Token::Word(w) => w.to_str(),
            _ => {
                return Err(SyntaxError::new(
                    format!("`{keyword}` must be followed by a name"),
                    self.offset(),
                ));
            }
        };

        self.skip_newlines();
        let mut words = Vec::new();

        if matches!(self.peek(), Token::In) {
            self.advance(); // skip 'in'
            while let Token::Word(w) = self.peek() {
                words.push(w.clone());
                self.advance();
            }
        }

        self.skip_separator();
        Ok((var, words))
    }

    /// Skip one `;` or newline, then any further newlines.
    fn skip_separator(&mut self) {
        if matches!(self.peek(), Token::Semi | Token::Newline) {
            self.advance();
        }
        self.skip_newlines();
    }

    /// `coproc [NAME] command`. A name is only taken when a compound command
    /// follows it; otherwise the words belong to a simple command.
    fn parse_coproc(&mut self) -> ParseResult<Command> {
        self.advance(); // skip 'coproc'

        let name = match (self.peek(), self.peek_at(1)) {
            (
                Token::Word(w),
                Token::LBrace
                | Token::LParen
                | Token::If
                | Token::For
                | Token::Select
                | Token::While
                | Token::Until
                | Token::Case,
            ) => Some(w.to_str()),
            _ => None,
        };
        if name.is_some() {
            self.advance();
        }
        let body = self.parse_command()?;

        Ok(Command::Coproc {
            name,
            body: Box::new(body),
        })
    }

    /// `do <list> done`
    fn parse_do_group(&mut self, context: &str) -> ParseResult<Command> {
        self.expect(&Token::Do, context)?;
        self.skip_newlines();
        let body = self.parse_list()?;
        self.skip_newlines();
        self.expect(&Token::Done, "`do` block")?;
        Ok(body)
    }

    fn parse_while(&mut self) -> ParseResult<Command> {
        self.advance(); // skip 'while'
        self.skip_newlines();
        let condition = self.parse_list()?;
        self.skip_newlines();
        let body = self.parse_do_group("`while` condition")?;

        Ok(Command::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    fn parse_until(&mut self) -> ParseResult<Command> {
        self.advance(); // skip 'until'
        self.skip_newlines();
        let condition = self.parse_list()?;
        self.skip_newlines();
        let body = self.parse_do_group("`until` condition")?;

        Ok(Command::Until {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    fn parse_case(&mut self) -> ParseResult<Command> {
        let line = self.line();
        self.advance(); // skip 'case'
        self.skip_newlines();

        let word = match self.advance() {
            Token::Word(w) => w,
            _ => return Err(SyntaxError::new("`case` must be followed by a word", self.offset())),
        };

        self.skip_newlines();
        self.expect(&Token::In, "`case` word")?;
        self.skip_newlines();

        let mut arms = Vec::new();

        while !matches!(self.peek(), Token::Esac | Token::Eof) {
            // Skip optional (
            if matches!(self.peek(), Token::LParen) {
                self.advance();
            }

            // Read patterns separated by |
            let mut patterns = Vec::new();
            while let Token::Word(w) = self.peek() {
                patterns.push(w.clone());
                self.advance();
                if matches!(self.peek(), Token::Pipe) {
                    self.advance();
                } else {
                    break;
                }
            }

            self.expect(&Token::RParen, "`case` pattern")?;
            self.skip_newlines();

            // Parse body until ;; or ;& or ;;& or esac
            let body = if matches!(
                self.peek(),
                Token::DoubleSemi | Token::SemiAmp | Token::DoubleSemiAmp | Token::Esac
            ) {
                None
            } else {
                Some(self.parse_list()?)
            };

            let terminator = match self.peek() {
                Token::DoubleSemi => CaseTerminator::Break,
                Token::SemiAmp => CaseTerminator::Fallthrough,
                Token::DoubleSemiAmp => CaseTerminator::Continue,
                _ => {
                    arms.push(CaseArm { patterns, body, terminator: CaseTerminator::Break });
                    break;
                }
            };
            self.advance();
            self.skip_newlines();
            arms.push(CaseArm {
                patterns,
                body,
                terminator,
            });
        }

        self.skip_newlines();
        self.expect(&Token::Esac, "`case` statement")?;

        Ok(Command::Case { word, arms, line })
    }

    fn parse_function_def(&mut self) -> ParseResult<Command> {
        self.advance(); // skip 'function'
        self.skip_newlines();

        let name = match self.advance() {
            Token::Word(w) => w.to_str(),
            _ => {
                return Err(SyntaxError::new(
                    "`function` must be followed by a name",
                    self.offset(),
                ));
            }
        };

        // Optional ()
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            self.expect(&Token::RParen, "`(`")?;
        }

        self.skip_newlines();
        let body = self.parse_command()?;

        Ok(Command::FunctionDef {
            name,
            body: Box::new(body),
        })
    }

    fn parse_subshell(&mut self) -> ParseResult<Command> {
        self.advance(); // skip (
        self.skip_newlines();
        let body = self.parse_list()?;
        self.skip_newlines();
        self.expect(&Token::RParen, "subshell")?;

        Ok(Command::Subshell(Box::new(body)))
    }

    fn parse_brace_group(&mut self) -> ParseResult<Command> {
        self.advance(); // skip {
        self.skip_newlines();
        let body = self.parse_list()?;
        self.skip_newlines();
        self.expect(&Token::RBrace, "`{` block")?;

        Ok(Command::BraceGroup(Box::new(body)))
    }
}

/// Split a `NAME=value` or `NAME+=value` word into an assignment, if it is one.
fn as_assignment(w: &Word, line: usize) -> Option<Assignment> {
    let WordPart::Literal(s) = w.parts.first()? else {
        return None;
    };
    let (name, value_start) = s.split_once('=')?;
    // `NAME+=value` appends; it assigns the same name.
    let name = name.strip_suffix('+').unwrap_or(name);
    let valid_name = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name.chars().next().is_some_and(|c| !c.is_ascii_digit());
    if !valid_name {
        return None;
    }
    let mut value_parts = Vec::new();
    if !value_start.is_empty() {
        value_parts.push(WordPart::Literal(value_start.to_string()));
    }
    value_parts.extend(w.parts[1..].iter().cloned());
    let value = if value_parts.is_empty() {
        Word::literal("")
    } else {
        Word { parts: value_parts }
    };
    Some(Assignment {
        name: name.to_string(),
        value,
        line,
    })
}
