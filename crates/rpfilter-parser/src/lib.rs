//! rpfilter-parser - Canonical text to filter expression trees
//!
//! This crate parses the canonical textual form of policy filter
//! expressions (the form `FilterExpr`'s `Display` emits) back into trees.
//! `parse(print(T))` is structurally equal to `T`.

pub mod error;
pub mod filter_parser;
pub mod lexer;

// Re-export main parser types
pub use error::{ParseError, Result};
pub use filter_parser::{parse, FilterParser};
