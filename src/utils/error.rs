//! Error handling for clens

use thiserror::Error;

use crate::frontend::token::Token;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error
///
/// Only the parser fails; the lexer, pre-checker and analyzer always produce
/// output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Parser Errors ====================

    #[error("Line {}: expected {expected}, found '{}'", .token.line, .token.value)]
    UnexpectedToken { expected: String, token: Token },

    #[error("Expected {expected}, found end of input")]
    UnexpectedEof { expected: String },

    #[error("Line {line}: nesting deeper than {limit} levels")]
    NestingTooDeep { line: usize, limit: usize },

    // ==================== Output Errors ====================

    #[error("JSON error: {0}")]
    Json(String),
}

impl Error {
    /// The offending token, if the error points at one
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::UnexpectedToken { token, .. } => Some(token),
            Self::UnexpectedEof { .. } | Self::NestingTooDeep { .. } | Self::Json(_) => None,
        }
    }

    /// The construct the parser was looking for
    pub fn expected(&self) -> Option<&str> {
        match self {
            Self::UnexpectedToken { expected, .. } | Self::UnexpectedEof { expected } => {
                Some(expected)
            }
            Self::NestingTooDeep { .. } | Self::Json(_) => None,
        }
    }

    /// Source line of the error, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::NestingTooDeep { line, .. } => Some(*line),
            _ => self.token().map(|t| t.line),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
