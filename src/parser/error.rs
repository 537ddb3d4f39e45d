use super::tokenizer::{Token, TokenType};

/// A failed required-token check. Carries the offending token and the
/// token type the grammar demanded in its place.
#[derive(Debug)]
pub struct SyntaxError {
    token: Token,
    expected: TokenType,
}

impl SyntaxError {
    pub(crate) fn new(token: Token, expected: TokenType) -> Self {
        Self { token, expected }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Syntax error at {}: unexpected token {}, expected {:?}",
            self.token.loc, self.token, self.expected
        )
    }
}

impl std::error::Error for SyntaxError {}
