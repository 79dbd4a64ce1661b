//! Parser error types

use rpfilter_core::CoreError;
use thiserror::Error;

/// Parser error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Input ended where a token was required
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// A token that cannot appear here
    #[error("unexpected token '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    /// An opening delimiter with no close
    #[error("unterminated {what} starting at offset {offset}")]
    Unterminated { what: &'static str, offset: usize },

    /// Extra input after a complete filter
    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },

    /// Invalid value inside an otherwise well-formed token
    #[error(transparent)]
    Invalid(#[from] CoreError),
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
