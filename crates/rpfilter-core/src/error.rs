//! Error types for rpfilter-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed prefix text or host bits set below the mask
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Mask-length bound outside `[prefix length, host length]`, or min > max
    #[error("invalid prefix range: {0}")]
    InvalidRange(String),

    /// AS-path regular expression that cannot be translated or compiled
    #[error("invalid AS-path regex '{pattern}': {reason}")]
    InvalidPathRegex { pattern: String, reason: String },

    /// Unknown address-family token
    #[error("invalid address-family token: {0}")]
    InvalidAfi(String),

    /// Hop-count range with low bound above high bound
    #[error("invalid hop range: {low} exceeds {high}")]
    InvalidHopRange { low: u32, high: u32 },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
