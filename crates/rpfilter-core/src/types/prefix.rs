//! Prefix ranges: address blocks with mask-length bounds
//!
//! A range entry pairs a network block with a `[min, max]` mask-length
//! bound. A candidate prefix matches when it lies inside the block and its
//! own length lies inside the bound. The RPSL entry operators `^-`, `^+`,
//! `^n` and `^n-m` are sugar over the bound and normalize away on parse.

use crate::error::CoreError;
use cidr::{IpCidr, Ipv4Cidr};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

const V4_HOST_LEN: u8 = 32;
const V6_HOST_LEN: u8 = 128;

/// A concrete announced prefix (address block, no length bound).
///
/// Router addresses are carried as host-length prefixes of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MpPrefix(IpCidr);

impl MpPrefix {
    /// Create a prefix from an address and length; host bits must be zero
    pub fn new(addr: IpAddr, length: u8) -> Result<Self, CoreError> {
        IpCidr::new(addr, length)
            .map(MpPrefix)
            .map_err(|_| CoreError::InvalidPrefix(format!("{addr}/{length}")))
    }

    /// A host-length prefix for a single address
    pub fn host(addr: IpAddr) -> Self {
        MpPrefix(IpCidr::new_host(addr))
    }

    /// Network address
    pub fn addr(&self) -> IpAddr {
        self.0.first_address()
    }

    /// Mask length
    pub fn length(&self) -> u8 {
        self.0.network_length()
    }

    pub fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }

    /// True when the mask covers the whole address
    pub fn is_host(&self) -> bool {
        self.length() == host_len(self.is_ipv4())
    }
}

impl fmt::Display for MpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr(), self.length())
    }
}

impl FromStr for MpPrefix {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((addr, len)) = s.split_once('/') {
            let addr: IpAddr = addr
                .parse()
                .map_err(|_| CoreError::InvalidPrefix(s.to_string()))?;
            let len: u8 = len
                .parse()
                .map_err(|_| CoreError::InvalidPrefix(s.to_string()))?;
            MpPrefix::new(addr, len)
        } else {
            let addr: IpAddr = s
                .parse()
                .map_err(|_| CoreError::InvalidPrefix(s.to_string()))?;
            Ok(MpPrefix::host(addr))
        }
    }
}

fn host_len(is_ipv4: bool) -> u8 {
    if is_ipv4 {
        V4_HOST_LEN
    } else {
        V6_HOST_LEN
    }
}

/// Normalize an `^` entry operator into a `[min, max]` length bound.
fn parse_length_op(prefix_len: u8, host: u8, op: Option<&str>, entry: &str) -> Result<(u8, u8), CoreError> {
    let invalid = || CoreError::InvalidRange(entry.to_string());
    let (min, max) = match op {
        None => (prefix_len, prefix_len),
        Some("+") => (prefix_len, host),
        Some("-") => {
            // ^- on a host-length prefix denotes an empty range
            if prefix_len >= host {
                return Err(invalid());
            }
            (prefix_len + 1, host)
        }
        Some(range) => {
            let (low, high) = match range.split_once('-') {
                Some((low, high)) => (
                    low.parse::<u8>().map_err(|_| invalid())?,
                    high.parse::<u8>().map_err(|_| invalid())?,
                ),
                None => {
                    let n = range.parse::<u8>().map_err(|_| invalid())?;
                    (n, n)
                }
            };
            (low, high)
        }
    };
    if min < prefix_len || min > max || max > host {
        return Err(invalid());
    }
    Ok((min, max))
}

/// Render a `[min, max]` bound back in its shortest entry-operator form.
fn fmt_length_op(
    f: &mut fmt::Formatter<'_>,
    prefix_len: u8,
    host: u8,
    min: u8,
    max: u8,
) -> fmt::Result {
    if (min, max) == (prefix_len, prefix_len) {
        Ok(())
    } else if (min, max) == (prefix_len, host) {
        write!(f, "^+")
    } else if (min, max) == (prefix_len + 1, host) {
        write!(f, "^-")
    } else if min == max {
        write!(f, "^{min}")
    } else {
        write!(f, "^{min}-{max}")
    }
}

fn split_entry(s: &str) -> (&str, Option<&str>) {
    match s.find('^') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    }
}

/// An IPv4 prefix-range entry: block plus mask-length bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRange {
    cidr: Ipv4Cidr,
    min_len: u8,
    max_len: u8,
}

impl PrefixRange {
    /// Create an entry with an explicit bound
    pub fn new(cidr: Ipv4Cidr, min_len: u8, max_len: u8) -> Result<Self, CoreError> {
        if min_len < cidr.network_length() || min_len > max_len || max_len > V4_HOST_LEN {
            return Err(CoreError::InvalidRange(format!(
                "{}/{}^{}-{}",
                cidr.first_address(),
                cidr.network_length(),
                min_len,
                max_len
            )));
        }
        Ok(PrefixRange { cidr, min_len, max_len })
    }

    /// An entry matching exactly the block's own length
    pub fn exact(cidr: Ipv4Cidr) -> Self {
        let len = cidr.network_length();
        PrefixRange { cidr, min_len: len, max_len: len }
    }

    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    pub fn min_len(&self) -> u8 {
        self.min_len
    }

    pub fn max_len(&self) -> u8 {
        self.max_len
    }

    /// Does a candidate `addr/length` prefix fall inside this entry?
    pub fn contains(&self, addr: Ipv4Addr, length: u8) -> bool {
        length >= self.min_len && length <= self.max_len && self.cidr.contains(&addr)
    }
}

impl fmt::Display for PrefixRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cidr.first_address(), self.cidr.network_length())?;
        fmt_length_op(f, self.cidr.network_length(), V4_HOST_LEN, self.min_len, self.max_len)
    }
}

impl FromStr for PrefixRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, op) = split_entry(s);
        let cidr: Ipv4Cidr = prefix
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidPrefix(prefix.to_string()))?;
        let (min_len, max_len) = parse_length_op(cidr.network_length(), V4_HOST_LEN, op, s)?;
        PrefixRange::new(cidr, min_len, max_len)
    }
}

/// A multiprotocol (IPv4 or IPv6) prefix-range entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpPrefixRange {
    cidr: IpCidr,
    min_len: u8,
    max_len: u8,
}

impl MpPrefixRange {
    /// Create an entry with an explicit bound
    pub fn new(cidr: IpCidr, min_len: u8, max_len: u8) -> Result<Self, CoreError> {
        let host = host_len(cidr.is_ipv4());
        if min_len < cidr.network_length() || min_len > max_len || max_len > host {
            return Err(CoreError::InvalidRange(format!(
                "{}/{}^{}-{}",
                cidr.first_address(),
                cidr.network_length(),
                min_len,
                max_len
            )));
        }
        Ok(MpPrefixRange { cidr, min_len, max_len })
    }

    /// An entry matching exactly the block's own length
    pub fn exact(cidr: IpCidr) -> Self {
        let len = cidr.network_length();
        MpPrefixRange { cidr, min_len: len, max_len: len }
    }

    pub fn cidr(&self) -> IpCidr {
        self.cidr
    }

    pub fn min_len(&self) -> u8 {
        self.min_len
    }

    pub fn max_len(&self) -> u8 {
        self.max_len
    }

    pub fn is_ipv4(&self) -> bool {
        self.cidr.is_ipv4()
    }

    /// Does a candidate prefix fall inside this entry?
    pub fn contains(&self, prefix: &MpPrefix) -> bool {
        prefix.length() >= self.min_len
            && prefix.length() <= self.max_len
            && self.cidr.contains(&prefix.addr())
    }

    /// The IPv4 view of this entry, if it is an IPv4 entry
    pub fn to_v4(&self) -> Option<PrefixRange> {
        match self.cidr {
            IpCidr::V4(cidr) => Some(PrefixRange {
                cidr,
                min_len: self.min_len,
                max_len: self.max_len,
            }),
            IpCidr::V6(_) => None,
        }
    }
}

impl From<PrefixRange> for MpPrefixRange {
    fn from(range: PrefixRange) -> Self {
        MpPrefixRange {
            cidr: IpCidr::V4(range.cidr),
            min_len: range.min_len,
            max_len: range.max_len,
        }
    }
}

impl fmt::Display for MpPrefixRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cidr.first_address(), self.cidr.network_length())?;
        fmt_length_op(
            f,
            self.cidr.network_length(),
            host_len(self.cidr.is_ipv4()),
            self.min_len,
            self.max_len,
        )
    }
}

impl FromStr for MpPrefixRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, op) = split_entry(s);
        let cidr: IpCidr = prefix
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidPrefix(prefix.to_string()))?;
        let host = host_len(cidr.is_ipv4());
        let (min_len, max_len) = parse_length_op(cidr.network_length(), host, op, s)?;
        MpPrefixRange::new(cidr, min_len, max_len)
    }
}

/// An ordered list of IPv4 prefix-range entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixRanges(Vec<PrefixRange>);

impl PrefixRanges {
    pub fn new() -> Self {
        PrefixRanges(Vec::new())
    }

    pub fn push(&mut self, range: PrefixRange) {
        self.0.push(range);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrefixRange> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Does any entry contain the candidate `addr/length` prefix?
    pub fn contains(&self, addr: Ipv4Addr, length: u8) -> bool {
        self.0.iter().any(|r| r.contains(addr, length))
    }
}

impl From<Vec<PrefixRange>> for PrefixRanges {
    fn from(ranges: Vec<PrefixRange>) -> Self {
        PrefixRanges(ranges)
    }
}

impl fmt::Display for PrefixRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

impl FromStr for PrefixRanges {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(PrefixRanges::new());
        }
        let ranges = s
            .split(',')
            .map(|entry| entry.parse::<PrefixRange>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PrefixRanges(ranges))
    }
}

/// An ordered list of multiprotocol prefix-range entries.
///
/// The list logically partitions into its v4 and v6 subsets; both
/// projections are pure and loss-free for the projected subset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MpPrefixRanges(Vec<MpPrefixRange>);

impl MpPrefixRanges {
    pub fn new() -> Self {
        MpPrefixRanges(Vec::new())
    }

    pub fn push(&mut self, range: MpPrefixRange) {
        self.0.push(range);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MpPrefixRange> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Does any entry contain the candidate prefix?
    pub fn contains(&self, prefix: &MpPrefix) -> bool {
        self.0.iter().any(|r| r.contains(prefix))
    }

    /// True when every entry is IPv4
    pub fn is_all_v4(&self) -> bool {
        self.0.iter().all(|r| r.is_ipv4())
    }

    /// The IPv4 subset as a v4-typed list; empty if there are no v4 entries
    pub fn project_v4(&self) -> PrefixRanges {
        PrefixRanges(self.0.iter().filter_map(|r| r.to_v4()).collect())
    }

    /// The IPv6 subset, still multiprotocol-typed
    pub fn project_v6(&self) -> MpPrefixRanges {
        MpPrefixRanges(self.0.iter().filter(|r| !r.is_ipv4()).copied().collect())
    }
}

impl From<Vec<MpPrefixRange>> for MpPrefixRanges {
    fn from(ranges: Vec<MpPrefixRange>) -> Self {
        MpPrefixRanges(ranges)
    }
}

impl From<PrefixRanges> for MpPrefixRanges {
    fn from(ranges: PrefixRanges) -> Self {
        MpPrefixRanges(ranges.0.into_iter().map(MpPrefixRange::from).collect())
    }
}

impl fmt::Display for MpPrefixRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

impl FromStr for MpPrefixRanges {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(MpPrefixRanges::new());
        }
        let ranges = s
            .split(',')
            .map(|entry| entry.parse::<MpPrefixRange>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MpPrefixRanges(ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(s: &str) -> PrefixRange {
        s.parse().unwrap()
    }

    fn mp(s: &str) -> MpPrefixRange {
        s.parse().unwrap()
    }

    #[test]
    fn test_exact_entry() {
        let r = v4("10.0.0.0/8");
        assert_eq!(r.min_len(), 8);
        assert_eq!(r.max_len(), 8);
        assert!(r.contains("10.1.0.0".parse().unwrap(), 8));
        assert!(!r.contains("10.1.0.0".parse().unwrap(), 9));
    }

    #[test]
    fn test_inclusive_more_specifics() {
        let r = v4("10.0.0.0/8^+");
        assert_eq!((r.min_len(), r.max_len()), (8, 32));
        assert!(r.contains("10.0.0.0".parse().unwrap(), 8));
        assert!(r.contains("10.255.0.0".parse().unwrap(), 32));
    }

    #[test]
    fn test_exclusive_more_specifics() {
        let r = v4("10.0.0.0/8^-");
        assert_eq!((r.min_len(), r.max_len()), (9, 32));
        assert!(!r.contains("10.0.0.0".parse().unwrap(), 8));
        assert!(r.contains("10.2.0.0".parse().unwrap(), 16));
    }

    #[test]
    fn test_length_window() {
        // /8 block, lengths 24..32 only
        let r = v4("10.0.0.0/8^24-32");
        assert!(r.contains("10.9.9.0".parse().unwrap(), 24));
        assert!(r.contains("10.9.9.9".parse().unwrap(), 32));
        assert!(!r.contains("10.9.0.0".parse().unwrap(), 23));
        // inside the window but outside the block
        assert!(!r.contains("11.0.0.0".parse().unwrap(), 24));
    }

    #[test]
    fn test_host_prefix_exclusive_rejected() {
        assert!("192.0.2.1/32^-".parse::<PrefixRange>().is_err());
        assert!("2001:db8::1/128^-".parse::<MpPrefixRange>().is_err());
    }

    #[test]
    fn test_bounds_validated() {
        assert!("10.0.0.0/8^4-16".parse::<PrefixRange>().is_err()); // min below block
        assert!("10.0.0.0/8^24-16".parse::<PrefixRange>().is_err()); // min > max
        assert!("10.0.0.0/8^16-40".parse::<PrefixRange>().is_err()); // max past host
    }

    #[test]
    fn test_display_shortest_form() {
        for text in [
            "10.0.0.0/8",
            "10.0.0.0/8^+",
            "10.0.0.0/8^-",
            "10.0.0.0/8^16",
            "10.0.0.0/8^16-24",
        ] {
            assert_eq!(v4(text).to_string(), text);
        }
        // an explicit range equal to ^+ prints as ^+
        assert_eq!(v4("10.0.0.0/8^8-32").to_string(), "10.0.0.0/8^+");
    }

    #[test]
    fn test_mp_entry_v6() {
        let r = mp("2001:db8::/32^-");
        assert_eq!((r.min_len(), r.max_len()), (33, 128));
        assert!(!r.is_ipv4());
        assert!(r.contains(&"2001:db8:1::/48".parse().unwrap()));
        assert!(!r.contains(&"2001:db8::/32".parse().unwrap()));
    }

    #[test]
    fn test_mp_contains_is_family_aware() {
        let r = mp("10.0.0.0/8^+");
        assert!(!r.contains(&"2001:db8::/32".parse().unwrap()));
    }

    #[test]
    fn test_projections() {
        let list: MpPrefixRanges = "10.0.0.0/8^+, 2001:db8::/32, 192.168.0.0/16^24"
            .parse()
            .unwrap();
        let v4 = list.project_v4();
        assert_eq!(v4.len(), 2);
        assert_eq!(v4.to_string(), "10.0.0.0/8^+, 192.168.0.0/16^24");

        let v6 = list.project_v6();
        assert_eq!(v6.len(), 1);
        assert_eq!(v6.to_string(), "2001:db8::/32");

        // projections are pure
        assert_eq!(list.len(), 3);
        // and idempotent
        assert_eq!(v6.project_v6(), v6);
        assert_eq!(
            MpPrefixRanges::from(v4.clone()).project_v4(),
            v4
        );
    }

    #[test]
    fn test_projection_of_homogeneous_list_is_loss_free() {
        let list: MpPrefixRanges = "10.0.0.0/8, 172.16.0.0/12^+".parse().unwrap();
        assert_eq!(MpPrefixRanges::from(list.project_v4()), list);
    }

    #[test]
    fn test_host_bits_rejected() {
        assert!("10.0.0.1/8".parse::<PrefixRange>().is_err());
    }

    #[test]
    fn test_mp_prefix_parse_and_host() {
        let p: MpPrefix = "192.0.2.1".parse().unwrap();
        assert!(p.is_host());
        assert_eq!(p.length(), 32);
        let p6: MpPrefix = "2001:db8::/32".parse().unwrap();
        assert!(!p6.is_ipv4());
        assert_eq!(p6.to_string(), "2001:db8::/32");
    }
}
