//! rpfilter-core - Filter expression tree for routing-policy filters
//!
//! This crate provides the fundamental types of the rpfilter engine:
//! - The `FilterExpr` tree: boolean combinators, AS/prefix/AS-path leaf
//!   matchers, named-set references, address-family scoping
//! - Domain primitives: AS paths and AS-path regexes, prefix ranges with
//!   mask-length bounds, address-family tokens
//! - Error types

pub mod ast;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use ast::{FilterExpr, HopOp, Item};
pub use error::CoreError;
pub use types::{
    Afi, AsPath, Asn, CompiledPathRegex, MpPrefix, MpPrefixRange, MpPrefixRanges, PathRegex,
    PrefixRange, PrefixRanges, SetName,
};
