//! rpfilter-runtime - Evaluation engine for policy filter expressions
//!
//! This crate evaluates `FilterExpr` trees against candidate routes:
//! - The `Dictionary` capability resolving named sets and RP-attribute
//!   methods, with an in-memory implementation and a YAML loader
//! - The `RouteInfo` route descriptor
//! - The `Evaluator`: boolean algebra with unresolved-reference
//!   dominance, cycle-guarded named-set expansion, hop-count matching,
//!   and route-component validation

pub mod dictionary;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod route;

// Re-export main types
pub use dictionary::{
    AsSetDef, AsSetMember, Dictionary, FilterSetDef, InMemoryDictionary, RouteSetDef,
    RouteSetMember, RouterSetDef, RouterSetMember, RpMethod, SetDef, SetKind,
};
pub use error::{EvalError, LoadError, Result};
pub use evaluator::Evaluator;
pub use loader::load_dictionary;
pub use route::RouteInfo;
