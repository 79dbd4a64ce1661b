//! AST definitions for policy filter expressions

pub mod filter;
pub mod item;

pub use filter::{FilterExpr, HopOp};
pub use item::Item;
