//! Domain primitive types: AS numbers, symbolic names, address families,
//! AS paths and prefix ranges.

pub mod afi;
pub mod aspath;
pub mod prefix;

pub use afi::Afi;
pub use aspath::{AsPath, CompiledPathRegex, PathRegex};
pub use prefix::{MpPrefix, MpPrefixRange, MpPrefixRanges, PrefixRange, PrefixRanges};

use serde::{Deserialize, Serialize};
use std::fmt;

/// An autonomous-system number (32-bit, RFC 6793)
pub type Asn = u32;

/// A symbolic handle naming a dictionary-resident object (as-set, route-set,
/// router-set or filter-set).
///
/// The name is stored as written; it is a lookup key, not an owned
/// definition. Comparison rules for lookups (case folding) belong to the
/// dictionary, so `SetName` equality is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetName(String);

impl SetName {
    /// Create a set name
    pub fn new(name: impl Into<String>) -> Self {
        SetName(name.into())
    }

    /// The name as written
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SetName {
    fn from(name: &str) -> Self {
        SetName::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_name_exact_equality() {
        assert_eq!(SetName::new("AS-FOO"), SetName::from("AS-FOO"));
        // case folding is the dictionary's job, not the handle's
        assert_ne!(SetName::new("AS-FOO"), SetName::new("as-foo"));
    }

    #[test]
    fn test_set_name_display() {
        assert_eq!(SetName::new("RS-MARTIANS").to_string(), "RS-MARTIANS");
    }
}
