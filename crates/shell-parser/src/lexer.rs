use super::ast::*;
use super::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Word(Word),
    Pipe,           // |
    And,            // &&
    Or,             // ||
    Semi,           // ;
    Amp,            // &
    LParen,         // (
    RParen,         // )
    LBrace,         // {
    RBrace,         // }
    Newline,
    If,
    Then,
    Elif,
    Else,
    Fi,
    For,
    In,
    While,
    Until,
    Do,
    Done,
    Case,
    Esac,
    DoubleSemi,     // ;;
    SemiAmp,        // ;&
    DoubleSemiAmp,  // ;;&
    Function,
    Select,
    Coproc,
    /// Body of a `for ((...))` header.
    Arithmetic(String),
    Redirect(Redirection),
    Eof,
}

impl Token {
    /// Short rendering used in error messages.
    pub(super) fn describe(&self) -> String {
        let s = match self {
            Token::Word(w) => return format!("`{}`", w.to_str()),
            Token::Redirect(r) => r.kind.as_str(),
            Token::Pipe => "|",
            Token::And => "&&",
            Token::Or => "||",
            Token::Semi => ";",
            Token::Amp => "&",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Newline => return "newline".to_string(),
            Token::If => "if",
            Token::Then => "then",
            Token::Elif => "elif",
            Token::Else => "else",
            Token::Fi => "fi",
            Token::For => "for",
            Token::In => "in",
            Token::While => "while",
            Token::Until => "until",
            Token::Do => "do",
            Token::Done => "done",
            Token::Case => "case",
            Token::Esac => "esac",
            Token::DoubleSemi => ";;",
            Token::SemiAmp => ";&",
            Token::DoubleSemiAmp => ";;&",
            Token::Function => "function",
            Token::Select => "select",
            Token::Coproc => "coproc",
            Token::Arithmetic(_) => "((",
            Token::Eof => return "end of input".to_string(),
        };
        format!("`{s}`")
    }
}

/// A token with its byte offset and 1-based line.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Lexeme {
    pub(super) token: Token,
    pub(super) offset: usize,
    pub(super) line: usize,
}

/// Where the next word sits, which decides whether reserved words are
/// recognised. `echo done` is an argument, `done` after `;` is a keyword.
#[derive(Debug, Clone, Copy, PartialEq)]
enum WordContext {
    Command,
    Argument,
    LoopName { is_for: bool },
    AwaitIn { is_for: bool },
    FunctionName,
    /// After `coproc`: reserved words still count, and a name may follow.
    CoprocName,
}

/// A here-document whose body starts on the next line.
struct PendingHeredoc {
    token_index: usize,
    delimiter: String,
    strip_tabs: bool,
    offset: usize,
}

pub(super) struct Lexer {
    input: Vec<char>,
    pos: usize,
    byte_pos: usize,
    line: usize,
    context: WordContext,
    pending: Vec<PendingHeredoc>,
    error: Option<SyntaxError>,
}

impl Lexer {
    pub(super) fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            pos: 0,
            byte_pos: 0,
            line: 1,
            context: WordContext::Command,
            pending: Vec::new(),
            error: None,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            self.byte_pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
            }
        }
        ch
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn save_state(&self) -> (usize, usize, usize) {
        (self.pos, self.byte_pos, self.line)
    }

    fn restore_state(&mut self, state: (usize, usize, usize)) {
        self.pos = state.0;
        self.byte_pos = state.1;
        self.line = state.2;
    }

    /// Record a lexical error. Only the first one is kept.
    fn fail(&mut self, message: impl Into<String>, offset: usize) {
        if self.error.is_none() {
            self.error = Some(SyntaxError::new(message, offset));
        }
    }

    /// Consume `end` if it is next, otherwise record an unterminated error
    /// pointing at `start`.
    fn close(&mut self, end: char, start: usize, what: &str) {
        if self.peek() == Some(end) {
            self.advance();
        } else {
            self.fail(format!("reached end of input without closing {what}"), start);
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == ' ' || ch == '\t' {
                self.advance();
            } else if ch == '\\' && self.peek_at(1) == Some('\n') {
                // Line continuation
                self.advance();
                self.advance();
            } else if ch == '#' {
                // Skip comment to end of line
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    pub(super) fn tokenize(mut self) -> Result<Vec<Lexeme>, SyntaxError> {
        let mut tokens: Vec<Lexeme> = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.byte_pos;
            let line = self.line;
            let token = match self.peek() {
                None => {
                    if let Some(p) = self.pending.first() {
                        let msg = format!("unclosed here-document `{}`", p.delimiter);
                        self.fail(msg, p.offset);
                    }
                    tokens.push(Lexeme { token: Token::Eof, offset: start, line });
                    break;
                }
                Some('\n') => {
                    self.advance();
                    tokens.push(Lexeme { token: Token::Newline, offset: start, line });
                    self.context = WordContext::Command;
                    self.read_pending_heredocs(&mut tokens);
                    continue;
                }
                Some(';') => {
                    self.advance();
                    if self.peek() == Some(';') {
                        self.advance();
                        if self.peek() == Some('&') {
                            self.advance();
                            Some(Token::DoubleSemiAmp)
                        } else {
                            Some(Token::DoubleSemi)
                        }
                    } else if self.peek() == Some('&') {
                        self.advance();
                        Some(Token::SemiAmp)
                    } else {
                        Some(Token::Semi)
                    }
                }
                Some('&') => {
                    if self.peek_at(1) == Some('>') {
                        self.advance(); // skip &
                        self.read_redirect_all()
                    } else {
                        self.advance();
                        if self.peek() == Some('&') {
                            self.advance();
                            Some(Token::And)
                        } else {
                            Some(Token::Amp)
                        }
                    }
                }
                Some('|') => {
                    self.advance();
                    if self.peek() == Some('|') {
                        self.advance();
                        Some(Token::Or)
                    } else {
                        Some(Token::Pipe)
                    }
                }
                Some('(')
                    if self.peek_at(1) == Some('(')
                        && matches!(self.context, WordContext::LoopName { is_for: true }) =>
                {
                    self.advance();
                    self.advance();
                    Some(Token::Arithmetic(self.read_until_double_paren(start, "`((`")))
                }
                Some('(') => {
                    self.advance();
                    Some(Token::LParen)
                }
                Some(')') => {
                    self.advance();
                    Some(Token::RParen)
                }
                Some(ch) if is_redirect_start(ch) => self.try_read_redirect_or_process_sub(),
                // Try to read a word (may include fd prefix for redirect)
                _ => self.read_word_or_keyword(),
            };
            if let Some(token) = token {
                self.push(&mut tokens, token, start, line);
            }
        }
        match self.error {
            Some(err) => Err(err),
            None => Ok(tokens),
        }
    }

    /// Append a token, registering heredoc operators so their bodies are read
    /// at the end of the line, and update the word context.
    fn push(&mut self, tokens: &mut Vec<Lexeme>, mut token: Token, offset: usize, line: usize) {
        if let Token::Redirect(ref mut r) = token
            && matches!(r.kind, RedirectionKind::Heredoc | RedirectionKind::HeredocStrip)
            && let RedirectionTarget::Heredoc(delimiter) = &mut r.target
        {
            self.pending.push(PendingHeredoc {
                token_index: tokens.len(),
                delimiter: std::mem::take(delimiter),
                strip_tabs: r.kind == RedirectionKind::HeredocStrip,
                offset,
            });
        }
        self.context = match (&token, self.context) {
            (Token::Redirect(_), ctx) => ctx,
            (Token::Word(_), WordContext::LoopName { is_for }) => WordContext::AwaitIn { is_for },
            (Token::Word(_), WordContext::FunctionName | WordContext::CoprocName) => {
                WordContext::Command
            }
            (Token::Word(_), _) => WordContext::Argument,
            (Token::For | Token::Select, _) => WordContext::LoopName { is_for: true },
            (Token::Case, _) => WordContext::LoopName { is_for: false },
            (Token::In, WordContext::AwaitIn { is_for: true }) => WordContext::Argument,
            (Token::Function, _) => WordContext::FunctionName,
            (Token::Coproc, _) => WordContext::CoprocName,
            (Token::Fi | Token::Done | Token::Esac | Token::RBrace, _) => WordContext::Argument,
            _ => WordContext::Command,
        };
        tokens.push(Lexeme { token, offset, line });
    }

    /// Read the bodies of every here-document opened on the line just ended,
    /// in the order the operators appeared.
    fn read_pending_heredocs(&mut self, tokens: &mut [Lexeme]) {
        for pending in std::mem::take(&mut self.pending) {
            let mut body = String::new();
            let mut closed = false;
            while self.peek().is_some() {
                let mut line = String::new();
                while let Some(ch) = self.advance() {
                    if ch == '\n' {
                        break;
                    }
                    line.push(ch);
                }
                let text = if pending.strip_tabs {
                    line.trim_start_matches('\t')
                } else {
                    line.as_str()
                };
                if text == pending.delimiter {
                    closed = true;
                    break;
                }
                body.push_str(text);
                body.push('\n');
            }
            if !closed {
                let msg = format!("unclosed here-document `{}`", pending.delimiter);
                self.fail(msg, pending.offset);
            }
            if let Some(Lexeme { token: Token::Redirect(r), .. }) = tokens.get_mut(pending.token_index) {
                r.target = RedirectionTarget::Heredoc(body);
            }
        }
    }

    fn try_read_redirect_or_process_sub(&mut self) -> Option<Token> {
        // Check for process substitution <(cmd) or >(cmd)
        let ch = self.peek()?;
        if (ch == '<' || ch == '>') && self.peek_at(1) == Some('(') {
            let direction = if ch == '<' {
                ProcessDirection::Input
            } else {
                ProcessDirection::Output
            };
            let start = self.byte_pos;
            self.advance(); // skip < or >
            self.advance(); // skip (
            let cmd = self.read_balanced_parens(start);
            let word = Word {
                parts: vec![WordPart::ProcessSubstitution {
                    direction,
                    command: cmd,
                }],
            };
            return Some(Token::Word(word));
        }

        self.read_redirection()
    }

    /// `&>` and `&>>`, with the `&` already consumed.
    fn read_redirect_all(&mut self) -> Option<Token> {
        let line = self.line;
        self.advance(); // skip >
        let kind = if self.peek() == Some('>') {
            self.advance();
            RedirectionKind::AppendAll
        } else {
            RedirectionKind::OutputAll
        };
        self.skip_whitespace();
        let target = self.read_redirect_target(kind);
        Some(Token::Redirect(Redirection { fd: None, kind, target, line }))
    }

    fn read_redirection(&mut self) -> Option<Token> {
        let ch = self.peek()?;
        let line = self.line;
        let fd = None; // fd prefix handled at word level

        let kind = match ch {
            '<' => {
                self.advance();
                match self.peek() {
                    Some('<') => {
                        self.advance();
                        match self.peek() {
                            Some('<') => {
                                self.advance();
                                RedirectionKind::Herestring
                            }
                            Some('-') => {
                                self.advance();
                                RedirectionKind::HeredocStrip
                            }
                            _ => RedirectionKind::Heredoc,
                        }
                    }
                    Some('&') => {
                        self.advance();
                        RedirectionKind::DupInput
                    }
                    _ => RedirectionKind::Input,
                }
            }
            '>' => {
                self.advance();
                match self.peek() {
                    Some('>') => {
                        self.advance();
                        RedirectionKind::Append
                    }
                    Some('|') => {
                        self.advance();
                        RedirectionKind::Clobber
                    }
                    Some('&') => {
                        self.advance();
                        RedirectionKind::DupOutput
                    }
                    _ => RedirectionKind::Output,
                }
            }
            _ => return None,
        };
        self.skip_whitespace();
        let target = self.read_redirect_target(kind);
        Some(Token::Redirect(Redirection { fd, kind, target, line }))
    }

    fn read_redirect_target(&mut self, kind: RedirectionKind) -> RedirectionTarget {
        match kind {
            RedirectionKind::DupInput | RedirectionKind::DupOutput => {
                // Read fd number or '-'
                let mut s = String::new();
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() || ch == '-' {
                        s.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
                if let Ok(fd) = s.parse::<i32>() {
                    RedirectionTarget::Fd(fd)
                } else {
                    RedirectionTarget::File(Word::literal(&s))
                }
            }
            RedirectionKind::Heredoc | RedirectionKind::HeredocStrip => {
                // The body is filled in once the current line ends; carry the
                // delimiter until then.
                RedirectionTarget::Heredoc(self.read_heredoc_delimiter())
            }
            _ => {
                let start = self.byte_pos;
                let parts = self.read_word_parts();
                if parts.is_empty() {
                    self.fail(format!("{} must be followed by a word", kind.as_str()), start);
                }
                RedirectionTarget::File(Word { parts })
            }
        }
    }

    fn read_plain_word_text(&mut self) -> String {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if is_word_char(ch) {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        s
    }

    /// Read a heredoc delimiter, handling quoted (`'EOF'`, `"EOF"`) and
    /// backslash-escaped (`\EOF`) forms by stripping the quoting.
    fn read_heredoc_delimiter(&mut self) -> String {
        let start = self.byte_pos;
        let delim = match self.peek() {
            Some('\'') => {
                self.advance();
                let s = self.read_until_char('\'');
                self.close('\'', start, "quote `'`");
                s
            }
            Some('"') => {
                self.advance();
                let s = self.read_until_char('"');
                self.close('"', start, "quote `\"`");
                s
            }
            Some('\\') => {
                self.advance(); // skip leading backslash
                self.read_plain_word_text()
            }
            _ => self.read_plain_word_text(),
        };
        if delim.is_empty() {
            self.fail("here-document must be followed by a delimiter", start);
        }
        delim
    }

    fn read_word_parts(&mut self) -> Vec<WordPart> {
        let mut parts = Vec::new();
        loop {
            let start = self.byte_pos;
            match self.peek() {
                None => break,
                Some(ch) if is_metachar(ch) => break,
                Some('\'') => {
                    self.advance();
                    let s = self.read_until_char('\'');
                    self.close('\'', start, "quote `'`");
                    parts.push(WordPart::SingleQuoted(s));
                }
                Some('"') => {
                    self.advance();
                    let inner = self.read_double_quoted_parts();
                    self.close('"', start, "quote `\"`");
                    parts.push(WordPart::DoubleQuoted(inner));
                }
                Some('$') => {
                    if let Some(part) = self.read_dollar() {
                        parts.push(part);
                    }
                }
                Some('`') => {
                    self.advance();
                    let s = self.read_until_char('`');
                    self.close('`', start, "backquote");
                    parts.push(WordPart::Backtick(s));
                }
                Some('{') => {
                    // Check for brace expansion: {a,b,c}
                    if let Some(exp) = self.try_read_brace_expansion() {
                        parts.push(WordPart::BraceExpansion(exp));
                    } else {
                        // Just a literal {
                        self.advance();
                        push_literal(&mut parts, "{");
                    }
                }
                Some(ch @ ('*' | '?')) => {
                    self.advance();
                    parts.push(WordPart::Glob(ch.to_string()));
                }
                Some('[') => {
                    self.advance(); // consume '['
                    match self.peek() {
                        // `[` followed by space, metachar, EOF, or `[` → literal, not glob
                        None | Some('[') | Some(']') => push_literal(&mut parts, "["),
                        Some(ch) if is_metachar(ch) => push_literal(&mut parts, "["),
                        Some(_) => {
                            // Glob bracket expression: [abc], [a-z], etc.
                            let mut glob = String::from("[");
                            while let Some(ch) = self.peek() {
                                if is_metachar(ch) {
                                    break;
                                }
                                glob.push(ch);
                                self.advance();
                                if ch == ']' {
                                    break;
                                }
                            }
                            parts.push(WordPart::Glob(glob));
                        }
                    }
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        // Line continuation joins the two halves
                        Some('\n') | None => {}
                        Some(escaped) => push_literal(&mut parts, &escaped.to_string()),
                    }
                }
                Some(_) => {
                    // Regular literal characters
                    let mut s = String::new();
                    while let Some(ch) = self.peek() {
                        if is_metachar(ch)
                            || matches!(ch, '\'' | '"' | '$' | '`' | '\\' | '*' | '?' | '[' | '{')
                        {
                            break;
                        }
                        s.push(ch);
                        self.advance();
                    }
                    if !s.is_empty() {
                        push_literal(&mut parts, &s);
                    }
                }
            }
        }
        parts
    }

    fn read_double_quoted_parts(&mut self) -> Vec<WordPart> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        loop {
            let start = self.byte_pos;
            match self.peek() {
                None | Some('"') => {
                    if !literal.is_empty() {
                        parts.push(WordPart::Literal(literal));
                    }
                    break;
                }
                Some('$') => {
                    if !literal.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut literal)));
                    }
                    if let Some(part) = self.read_dollar() {
                        parts.push(part);
                    }
                }
                Some('`') => {
                    if !literal.is_empty() {
                        parts.push(WordPart::Literal(std::mem::take(&mut literal)));
                    }
                    self.advance();
                    let s = self.read_until_char('`');
                    self.close('`', start, "backquote");
                    parts.push(WordPart::Backtick(s));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        // Only these are escapable inside double quotes
                        Some(ch @ ('"' | '\\' | '$' | '`')) => {
                            self.advance();
                            literal.push(ch);
                        }
                        Some('\n') => {
                            self.advance();
                        }
                        _ => literal.push('\\'),
                    }
                }
                Some(ch) => {
                    literal.push(ch);
                    self.advance();
                }
            }
        }
        parts
    }

    fn read_dollar(&mut self) -> Option<WordPart> {
        let start = self.byte_pos;
        self.advance(); // skip $
        match self.peek() {
            Some('(') => {
                self.advance(); // skip (
                if self.peek() == Some('(') {
                    // Arithmetic $((expr))
                    self.advance(); // skip second (
                    let expr = self.read_until_double_paren(start, "`$((`");
                    Some(WordPart::Arithmetic(expr))
                } else {
                    // Command substitution $(cmd)
                    let cmd = self.read_balanced_parens(start);
                    Some(WordPart::CommandSubstitution(cmd))
                }
            }
            Some('{') => {
                self.advance(); // skip {
                self.read_parameter_expansion(start)
            }
            Some('\'') => {
                // ANSI-C quoting $'...'
                self.advance(); // skip '
                let s = self.read_ansi_c_string();
                self.close('\'', start, "quote `$'`");
                Some(WordPart::AnsiCQuoted(s))
            }
            Some(ch)
                if ch.is_ascii_alphanumeric()
                    || matches!(ch, '_' | '@' | '#' | '?' | '-' | '!' | '$' | '*') =>
            {
                let mut name = String::new();
                if ch.is_ascii_alphabetic() || ch == '_' {
                    name = self.read_identifier();
                } else {
                    // Positional and special variables: $1, $@, $#, $?, $-, $!, $$, $*
                    name.push(ch);
                    self.advance();
                }
                Some(WordPart::Parameter(name))
            }
            _ => {
                // Bare $ at end or before non-variable char
                Some(WordPart::Literal("$".to_string()))
            }
        }
    }

    /// Consume the closing `}` of a `${...}` expansion starting at `start`.
    fn close_param(&mut self, start: usize) {
        self.close('}', start, "`${`");
    }

    /// Parse the content of `${...}` after the opening `{` has been consumed.
    /// Produces either a simple `ParameterExpansion(name)` for `${VAR}` or a
    /// structured `ParameterExpansionOp { name, op }` for operator forms.
    fn read_parameter_expansion(&mut self, start: usize) -> Option<WordPart> {
        // Special case: ${#VAR} (length operator)
        if self.peek() == Some('#') {
            let saved = self.save_state();
            self.advance(); // skip #
            let name = self.read_identifier();
            if !name.is_empty() && self.peek() == Some('}') {
                self.advance(); // skip }
                return Some(WordPart::ParameterExpansionOp {
                    name,
                    op: ParameterOperator::Length,
                });
            }
            // Not a length operator; restore and fall through to flat parsing
            self.restore_state(saved);
        }

        let name = self.read_identifier();
        if name.is_empty() {
            // Not a valid identifier; fall back to flat string
            let s = self.read_until_char('}');
            self.close_param(start);
            return Some(WordPart::ParameterExpansion(s));
        }

        let op = match self.peek() {
            Some('}') => {
                self.advance(); // skip }
                return Some(WordPart::ParameterExpansion(name));
            }
            Some(c @ ('#' | '%')) => {
                self.advance();
                let longest = self.eat(c);
                let pattern = self.read_until_char('}');
                if c == '#' {
                    ParameterOperator::StripPrefix { longest, pattern }
                } else {
                    ParameterOperator::StripSuffix { longest, pattern }
                }
            }
            Some('/') => {
                self.advance(); // skip /
                let all = self.eat('/');
                let pattern = self.read_until_either('/', '}');
                let replacement = if self.eat('/') {
                    self.read_until_char('}')
                } else {
                    String::new()
                };
                ParameterOperator::Replace { all, pattern, replacement }
            }
            Some(':') => {
                self.advance(); // skip :
                match self.peek() {
                    Some(c @ ('-' | '+' | '?' | '=')) => {
                        self.advance();
                        value_op(c, true, self.read_until_char('}'))
                    }
                    _ => {
                        // Substring: ${VAR:offset} or ${VAR:offset:length}
                        let offset = self.read_until_either(':', '}');
                        let length = if self.eat(':') {
                            Some(self.read_until_char('}'))
                        } else {
                            None
                        };
                        ParameterOperator::Substring { offset, length }
                    }
                }
            }
            Some(c @ ('-' | '+' | '?' | '=')) => {
                self.advance();
                value_op(c, false, self.read_until_char('}'))
            }
            Some(c @ ('^' | ',')) => {
                self.advance();
                let all = self.eat(c);
                self.read_until_char('}');
                if c == '^' {
                    ParameterOperator::Uppercase { all }
                } else {
                    ParameterOperator::Lowercase { all }
                }
            }
            _ => {
                // Unknown operator; fall back to flat string
                let rest = self.read_until_char('}');
                self.close_param(start);
                return Some(WordPart::ParameterExpansion(format!("{name}{rest}")));
            }
        };
        self.close_param(start);
        Some(WordPart::ParameterExpansionOp { name, op })
    }

    /// Consume `ch` if it is next.
    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Read a shell identifier (alphanumeric + underscore).
    fn read_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    /// Read until either `a` or `b` is found (or EOF). Does not consume the delimiter.
    fn read_until_either(&mut self, a: char, b: char) -> String {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if ch == a || ch == b {
                break;
            }
            s.push(ch);
            self.advance();
        }
        s
    }

    fn read_until_char(&mut self, end: char) -> String {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if ch == end {
                break;
            }
            s.push(ch);
            self.advance();
        }
        s
    }

    fn read_ansi_c_string(&mut self) -> String {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\'' {
                break;
            }
            self.advance();
            if ch != '\\' {
                s.push(ch);
                continue;
            }
            let Some(esc) = self.advance() else {
                s.push('\\');
                break;
            };
            match esc {
                'n' => s.push('\n'),
                't' => s.push('\t'),
                'r' => s.push('\r'),
                'a' => s.push('\x07'),
                'b' => s.push('\x08'),
                'e' | 'E' => s.push('\x1B'),
                'f' => s.push('\x0C'),
                'v' => s.push('\x0B'),
                '0' => {
                    let digits = self.read_digits(3, |c| matches!(c, '0'..='7'));
                    if digits.is_empty() {
                        s.push('\0');
                    } else {
                        s.extend(decode_codepoint(&digits, 8));
                    }
                }
                'x' => s.extend(decode_codepoint(&self.read_digits(2, |c| c.is_ascii_hexdigit()), 16)),
                'u' => s.extend(decode_codepoint(&self.read_digits(4, |c| c.is_ascii_hexdigit()), 16)),
                'U' => s.extend(decode_codepoint(&self.read_digits(8, |c| c.is_ascii_hexdigit()), 16)),
                'c' => {
                    // Control character: \cX
                    if let Some(ctrl) = self.advance() {
                        s.extend(char::from_u32((ctrl as u32) & 0x1F));
                    }
                }
                // \\, \', \" and unknown escapes are the character itself
                other => s.push(other),
            }
        }
        s
    }

    fn read_digits(&mut self, max: usize, accept: impl Fn(char) -> bool) -> String {
        let mut digits = String::new();
        while digits.len() < max {
            match self.peek() {
                Some(c) if accept(c) => {
                    digits.push(c);
                    self.advance();
                }
                _ => break,
            }
        }
        digits
    }

    /// Read an arithmetic expression up to the `))` that closes it. Inner
    /// parentheses must balance before `))` ends the expression.
    fn read_until_double_paren(&mut self, start: usize, opener: &str) -> String {
        let mut s = String::new();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => {
                    self.fail(format!("reached end of input without closing {opener}"), start);
                    break;
                }
                Some(')') if depth == 0 && self.peek_at(1) == Some(')') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(ch) => {
                    match ch {
                        '(' => depth += 1,
                        ')' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    s.push(ch);
                    self.advance();
                }
            }
        }
        s
    }

    /// Read the body of `$(...)` or `<(...)` after the opening paren, keeping
    /// quoted parentheses out of the depth count.
    fn read_balanced_parens(&mut self, start: usize) -> String {
        let mut s = String::new();
        let mut depth = 1;
        loop {
            match self.peek() {
                None => {
                    self.fail("reached end of input without closing `$(`", start);
                    break;
                }
                Some('(') => {
                    depth += 1;
                    s.push('(');
                    self.advance();
                }
                Some(')') => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                    s.push(')');
                }
                Some(q @ ('\'' | '"')) => {
                    s.push(q);
                    self.advance();
                    while let Some(ch) = self.advance() {
                        s.push(ch);
                        if ch == '\\' && q == '"' {
                            if let Some(next) = self.advance() {
                                s.push(next);
                            }
                        } else if ch == q {
                            break;
                        }
                    }
                }
                Some('\\') => {
                    s.push('\\');
                    self.advance();
                    if let Some(next) = self.advance() {
                        s.push(next);
                    }
                }
                Some(ch) => {
                    s.push(ch);
                    self.advance();
                }
            }
        }
        s
    }

    fn try_read_brace_expansion(&mut self) -> Option<Vec<String>> {
        // Lookahead to check if this is a brace expansion {a,b,...}
        let saved = self.save_state();
        self.advance(); // skip {
        let mut items = Vec::new();
        let mut current = String::new();
        let mut has_comma = false;
        loop {
            match self.peek() {
                Some('}') if has_comma => {
                    self.advance();
                    items.push(current);
                    return Some(items);
                }
                Some(',') => {
                    has_comma = true;
                    items.push(std::mem::take(&mut current));
                    self.advance();
                }
                // Unterminated, no comma, or not a simple brace expansion
                None | Some('}') => break,
                Some(ch) if is_metachar(ch) || matches!(ch, '\'' | '"' | '$' | '{') => break,
                Some(ch) => {
                    current.push(ch);
                    self.advance();
                }
            }
        }
        self.restore_state(saved);
        None
    }

    pub(super) fn read_word_or_keyword(&mut self) -> Option<Token> {
        // Check for fd number prefix before redirect
        let saved = self.save_state();
        let mut fd_str = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                fd_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if !fd_str.is_empty() {
            if let Some(ch) = self.peek()
                && is_redirect_start(ch)
                && self.peek_at(1) != Some('(')
            {
                let fd: Option<i32> = fd_str.parse().ok();
                if let Some(mut tok) = self.read_redirection() {
                    if let Token::Redirect(ref mut redir) = tok {
                        redir.fd = fd;
                    }
                    return Some(tok);
                }
            }
            // Not a redirect prefix, restore and read as word
            self.restore_state(saved);
        }

        let mut parts = self.read_word_parts();
        if parts.is_empty() {
            return None;
        }
        if self.peek() == Some('(') && is_array_assignment_prefix(&parts) {
            self.read_array_elements(&mut parts);
        }

        if let [WordPart::Literal(s)] = parts.as_slice()
            && let Some(keyword) = self.keyword(s)
        {
            return Some(keyword);
        }

        Some(Token::Word(Word { parts }))
    }

    /// Read the `(...)` of an array assignment onto the end of `parts`.
    /// Elements are kept as word parts, joined by single spaces.
    fn read_array_elements(&mut self, parts: &mut Vec<WordPart>) {
        let start = self.byte_pos;
        self.advance(); // skip (
        push_literal(parts, "(");
        let mut first = true;
        loop {
            self.skip_array_blanks();
            match self.peek() {
                None => {
                    self.fail("reached end of input without closing array `(`", start);
                    return;
                }
                Some(')') => {
                    self.advance();
                    push_literal(parts, ")");
                    return;
                }
                Some(ch) => {
                    let element = self.read_word_parts();
                    if element.is_empty() {
                        self.fail(format!("unexpected `{ch}` in array"), self.byte_pos);
                        return;
                    }
                    if !first {
                        push_literal(parts, " ");
                    }
                    first = false;
                    for part in element {
                        match part {
                            WordPart::Literal(text) => push_literal(parts, &text),
                            other => parts.push(other),
                        }
                    }
                }
            }
        }
    }

    /// Whitespace, newlines, line continuations and comments between array
    /// elements.
    fn skip_array_blanks(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\n') => {
                    self.advance();
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.advance();
                    self.advance();
                }
                Some('#') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    /// Map a bare literal to a reserved word, if one is allowed here.
    fn keyword(&self, s: &str) -> Option<Token> {
        match self.context {
            WordContext::Command | WordContext::CoprocName => Some(match s {
                "if" => Token::If,
                "then" => Token::Then,
                "elif" => Token::Elif,
                "else" => Token::Else,
                "fi" => Token::Fi,
                "for" => Token::For,
                "while" => Token::While,
                "until" => Token::Until,
                "do" => Token::Do,
                "done" => Token::Done,
                "case" => Token::Case,
                "esac" => Token::Esac,
                "function" => Token::Function,
                "select" => Token::Select,
                "coproc" => Token::Coproc,
                "{" => Token::LBrace,
                "}" => Token::RBrace,
                _ => return None,
            }),
            WordContext::AwaitIn { .. } => match s {
                "in" => Some(Token::In),
                "do" => Some(Token::Do),
                _ => None,
            },
            WordContext::Argument | WordContext::LoopName { .. } | WordContext::FunctionName => None,
        }
    }
}

/// True for a lone `NAME=` or `NAME+=` literal, the start of `NAME=(...)`.
fn is_array_assignment_prefix(parts: &[WordPart]) -> bool {
    let [WordPart::Literal(s)] = parts else {
        return false;
    };
    let Some(name) = s.strip_suffix('=') else {
        return false;
    };
    let name = name.strip_suffix('+').unwrap_or(name);
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn value_op(op: char, colon: bool, value: String) -> ParameterOperator {
    match op {
        '-' => ParameterOperator::Default { colon, value },
        '+' => ParameterOperator::Alternative { colon, value },
        '?' => ParameterOperator::Error { colon, message: value },
        _ => ParameterOperator::Assign { colon, value },
    }
}

fn decode_codepoint(digits: &str, radix: u32) -> Option<char> {
    u32::from_str_radix(digits, radix).ok().and_then(char::from_u32)
}

/// Append literal text, merging with a preceding literal part.
fn push_literal(parts: &mut Vec<WordPart>, text: &str) {
    if let Some(WordPart::Literal(s)) = parts.last_mut() {
        s.push_str(text);
    } else {
        parts.push(WordPart::Literal(text.to_string()));
    }
}

pub(super) fn is_metachar(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '|' | '&' | ';' | '(' | ')' | '<' | '>')
}

fn is_word_char(ch: char) -> bool {
    !is_metachar(ch) && ch != '\'' && ch != '"' && ch != '`' && ch != '$' && ch != '\\'
}

pub(super) fn is_redirect_start(ch: char) -> bool {
    ch == '<' || ch == '>'
}
