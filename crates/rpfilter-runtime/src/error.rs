//! Evaluation and loader error types

use crate::dictionary::SetKind;
use thiserror::Error;

/// Evaluation error
///
/// `UnresolvedReference` and `UnresolvedMethod` travel through the
/// combinator dominance rules before surfacing; the remaining kinds abort
/// evaluation immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Named set absent from the dictionary at evaluation time
    #[error("unresolved {kind} reference: {name}")]
    UnresolvedReference { kind: SetKind, name: String },

    /// RP-attribute method not registered in the dictionary
    #[error("unresolved rp-attribute method: {attr}.{method}")]
    UnresolvedMethod { attr: String, method: String },

    /// Named-set expansion revisited a name on the active path
    #[error("cyclic {kind} reference: {name}")]
    CyclicReference { kind: SetKind, name: String },

    /// A node that needs context the caller did not supply
    #[error("{what} used without the required evaluation context")]
    ContextMissing { what: &'static str },

    /// Arity or invariant violation; unreachable given a conforming parser
    #[error("malformed filter tree: {detail}")]
    MalformedTree { detail: String },
}

impl EvalError {
    /// True for the resolution failures subject to combinator dominance
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            EvalError::UnresolvedReference { .. } | EvalError::UnresolvedMethod { .. }
        )
    }
}

/// Result type for evaluation
pub type Result<T> = std::result::Result<T, EvalError>;

/// Dictionary loader error
#[derive(Error, Debug)]
pub enum LoadError {
    /// Malformed YAML document
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A filter-set body that does not parse as a filter expression
    #[error("invalid filter for filter-set '{name}': {source}")]
    Filter {
        name: String,
        source: rpfilter_parser::ParseError,
    },

    /// A member string that fits no member form for its set kind
    #[error("invalid member '{member}' in {kind} '{name}'")]
    Member {
        kind: SetKind,
        name: String,
        member: String,
    },
}
