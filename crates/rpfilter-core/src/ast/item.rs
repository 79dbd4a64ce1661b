//! Argument items for RP-attribute method calls

use crate::types::Asn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One argument in an RP-attribute method call, captured at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    /// Integer literal
    Int(i64),
    /// AS number literal
    Asn(Asn),
    /// Bare word (identifiers, community values such as `65000:100`)
    Word(String),
    /// Quoted string
    Str(String),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Int(n) => write!(f, "{n}"),
            Item::Asn(asn) => write!(f, "AS{asn}"),
            Item::Word(w) => f.write_str(w),
            Item::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_display() {
        assert_eq!(Item::Int(10).to_string(), "10");
        assert_eq!(Item::Asn(64500).to_string(), "AS64500");
        assert_eq!(Item::Word("65000:100".to_string()).to_string(), "65000:100");
        assert_eq!(Item::Str("no-export".to_string()).to_string(), "\"no-export\"");
    }
}
