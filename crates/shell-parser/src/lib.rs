mod ast;
mod error;
mod lexer;
mod parse;

#[cfg(test)]
mod tests;

pub use ast::*;
pub use error::{ParseError, offset_to_line_col};
use parse::Parser;

/// Parse a shell command string into an AST.
///
/// Empty or whitespace-only input yields an empty simple command. Malformed
/// input (unterminated quotes or substitutions, unclosed here-documents,
/// missing keywords, dangling operators) is reported as a [`ParseError`].
pub fn parse(input: &str) -> Result<Command, ParseError> {
    Parser::new(input)
        .and_then(|mut parser| parser.parse_complete())
        .map_err(|raw| ParseError::new(raw, input))
}
