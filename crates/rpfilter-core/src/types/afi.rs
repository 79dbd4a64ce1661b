//! Address-family indicator tokens

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An address-family indicator token as it appears in `afi` scoping lists.
///
/// `Any`, `Ipv4` and `Ipv6` are umbrella tokens covering their unicast and
/// multicast variants; routes themselves always carry a concrete
/// family/cast pair such as `Ipv4Unicast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Afi {
    /// `any`: every address family
    Any,
    /// `ipv4`: both IPv4 casts
    Ipv4,
    /// `ipv4.unicast`
    Ipv4Unicast,
    /// `ipv4.multicast`
    Ipv4Multicast,
    /// `ipv6`: both IPv6 casts
    Ipv6,
    /// `ipv6.unicast`
    Ipv6Unicast,
    /// `ipv6.multicast`
    Ipv6Multicast,
}

impl Afi {
    /// Does this token admit a route of family `other`?
    pub fn covers(self, other: Afi) -> bool {
        self == other
            || match self {
                Afi::Any => true,
                Afi::Ipv4 => matches!(other, Afi::Ipv4Unicast | Afi::Ipv4Multicast),
                Afi::Ipv6 => matches!(other, Afi::Ipv6Unicast | Afi::Ipv6Multicast),
                _ => false,
            }
    }

    /// True for `ipv4` and its casts
    pub fn is_ipv4(self) -> bool {
        matches!(self, Afi::Ipv4 | Afi::Ipv4Unicast | Afi::Ipv4Multicast)
    }

    /// True for `ipv6` and its casts
    pub fn is_ipv6(self) -> bool {
        matches!(self, Afi::Ipv6 | Afi::Ipv6Unicast | Afi::Ipv6Multicast)
    }
}

impl fmt::Display for Afi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Afi::Any => "any",
            Afi::Ipv4 => "ipv4",
            Afi::Ipv4Unicast => "ipv4.unicast",
            Afi::Ipv4Multicast => "ipv4.multicast",
            Afi::Ipv6 => "ipv6",
            Afi::Ipv6Unicast => "ipv6.unicast",
            Afi::Ipv6Multicast => "ipv6.multicast",
        };
        f.write_str(token)
    }
}

impl FromStr for Afi {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Afi::Any),
            "ipv4" => Ok(Afi::Ipv4),
            "ipv4.unicast" => Ok(Afi::Ipv4Unicast),
            "ipv4.multicast" => Ok(Afi::Ipv4Multicast),
            "ipv6" => Ok(Afi::Ipv6),
            "ipv6.unicast" => Ok(Afi::Ipv6Unicast),
            "ipv6.multicast" => Ok(Afi::Ipv6Multicast),
            _ => Err(CoreError::InvalidAfi(s.to_string())),
        }
    }
}
