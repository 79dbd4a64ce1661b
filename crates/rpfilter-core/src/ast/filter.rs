//! The filter expression tree
//!
//! One closed enum over every node kind a policy filter can contain.
//! Parents own their children exclusively (boxed slots); symbolic names
//! are non-owning [`SetName`] handles resolved through the dictionary at
//! evaluation time. `Clone` deep-clones owned children and copies handles
//! by value, and `Display` emits the canonical text the parser accepts.

use crate::ast::item::Item;
use crate::error::CoreError;
use crate::types::{Afi, MpPrefix, MpPrefixRanges, PathRegex, PrefixRanges, SetName};
use crate::types::Asn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A hop-count ("mile-stone") operator: how many additional AS hops may
/// follow the inner match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HopOp {
    /// `^-`: at least one additional hop
    AtLeastOne,
    /// `^+`: exactly one additional hop, then stop
    ExactlyOne,
    /// `^n` / `^n-m`: between `low` and `high` additional hops inclusive
    Between { low: u32, high: u32 },
}

impl HopOp {
    /// Create a `^n-m` operator; `low` must not exceed `high`
    pub fn between(low: u32, high: u32) -> Result<Self, CoreError> {
        if low > high {
            return Err(CoreError::InvalidHopRange { low, high });
        }
        Ok(HopOp::Between { low, high })
    }

    /// Does the operator admit `extra` additional hops?
    pub fn admits(self, extra: u32) -> bool {
        match self {
            HopOp::AtLeastOne => extra >= 1,
            HopOp::ExactlyOne => extra == 1,
            HopOp::Between { low, high } => extra >= low && extra <= high,
        }
    }
}

impl fmt::Display for HopOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HopOp::AtLeastOne => f.write_str("^-"),
            HopOp::ExactlyOne => f.write_str("^+"),
            HopOp::Between { low, high } if low == high => write!(f, "^{low}"),
            HopOp::Between { low, high } => write!(f, "^{low}-{high}"),
        }
    }
}

/// A policy filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Matches every route
    Any,
    /// Matches the peer AS supplied by the evaluation context
    PeerAs,
    /// AS-number literal, matched against the route's origin AS
    AsNum(Asn),
    /// Reference to a named as-set
    AsSet(SetName),
    /// Reference to a named route-set
    RouteSet(SetName),
    /// Reference to a named router-set
    RouterSet(SetName),
    /// Reference to a named filter-set
    FilterSet(SetName),
    /// AS-path regular expression
    AsPath(PathRegex),
    /// IPv4 prefix-range list
    Prefixes(PrefixRanges),
    /// Multiprotocol (v4/v6) prefix-range list
    MpPrefixes(MpPrefixRanges),
    /// Logical negation
    Not(Box<FilterExpr>),
    /// Both operands must match
    And {
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    /// Either operand must match
    Or {
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    /// Left must match and right must not
    Except {
        left: Box<FilterExpr>,
        right: Box<FilterExpr>,
    },
    /// Hop-count constraint over an optional inner path filter
    Hops {
        op: HopOp,
        inner: Option<Box<FilterExpr>>,
    },
    /// Address-family scoping of an inner filter
    Afi {
        afis: Vec<Afi>,
        inner: Box<FilterExpr>,
    },
    /// RP-attribute method invocation, e.g. `community.contains(65000:100)`
    Call {
        attr: String,
        method: String,
        args: Vec<Item>,
    },
    /// Route-object constraint: components must lie within the list
    HaveComponents(PrefixRanges),
    /// Route-object constraint: components must lie outside the list
    ExcludeComponents(PrefixRanges),
    /// `HAVE-COMPONENTS` for route6 objects
    MpHaveComponents(MpPrefixRanges),
    /// `EXCLUDE` for route6 objects
    MpExcludeComponents(MpPrefixRanges),
    /// Router identity by address
    Router(MpPrefix),
    /// Router identity by DNS name
    RouterName(String),
}

impl FilterExpr {
    pub fn and(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn except(left: FilterExpr, right: FilterExpr) -> Self {
        FilterExpr::Except {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(inner: FilterExpr) -> Self {
        FilterExpr::Not(Box::new(inner))
    }

    pub fn hops(op: HopOp, inner: Option<FilterExpr>) -> Self {
        FilterExpr::Hops {
            op,
            inner: inner.map(Box::new),
        }
    }

    pub fn afi(afis: Vec<Afi>, inner: FilterExpr) -> Self {
        FilterExpr::Afi {
            afis,
            inner: Box::new(inner),
        }
    }

    pub fn as_set(name: impl Into<String>) -> Self {
        FilterExpr::AsSet(SetName::new(name))
    }

    pub fn route_set(name: impl Into<String>) -> Self {
        FilterExpr::RouteSet(SetName::new(name))
    }

    pub fn router_set(name: impl Into<String>) -> Self {
        FilterExpr::RouterSet(SetName::new(name))
    }

    pub fn filter_set(name: impl Into<String>) -> Self {
        FilterExpr::FilterSet(SetName::new(name))
    }

    /// Node kind name, used by [`describe`](Self::describe)
    pub fn kind_name(&self) -> &'static str {
        match self {
            FilterExpr::Any => "Any",
            FilterExpr::PeerAs => "PeerAs",
            FilterExpr::AsNum(_) => "AsNum",
            FilterExpr::AsSet(_) => "AsSet",
            FilterExpr::RouteSet(_) => "RouteSet",
            FilterExpr::RouterSet(_) => "RouterSet",
            FilterExpr::FilterSet(_) => "FilterSet",
            FilterExpr::AsPath(_) => "AsPath",
            FilterExpr::Prefixes(_) => "Prefixes",
            FilterExpr::MpPrefixes(_) => "MpPrefixes",
            FilterExpr::Not(_) => "Not",
            FilterExpr::And { .. } => "And",
            FilterExpr::Or { .. } => "Or",
            FilterExpr::Except { .. } => "Except",
            FilterExpr::Hops { .. } => "Hops",
            FilterExpr::Afi { .. } => "Afi",
            FilterExpr::Call { .. } => "Call",
            FilterExpr::HaveComponents(_) => "HaveComponents",
            FilterExpr::ExcludeComponents(_) => "ExcludeComponents",
            FilterExpr::MpHaveComponents(_) => "MpHaveComponents",
            FilterExpr::MpExcludeComponents(_) => "MpExcludeComponents",
            FilterExpr::Router(_) => "Router",
            FilterExpr::RouterName(_) => "RouterName",
        }
    }

    /// Diagnostic structured dump: node kind plus leaf value per line,
    /// children indented. Not part of the canonical-text contract.
    pub fn describe<W: fmt::Write>(&self, out: &mut W, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            out.write_str("  ")?;
        }
        match self {
            FilterExpr::Not(inner) => {
                writeln!(out, "{}", self.kind_name())?;
                inner.describe(out, depth + 1)
            }
            FilterExpr::And { left, right }
            | FilterExpr::Or { left, right }
            | FilterExpr::Except { left, right } => {
                writeln!(out, "{}", self.kind_name())?;
                left.describe(out, depth + 1)?;
                right.describe(out, depth + 1)
            }
            FilterExpr::Hops { op, inner } => {
                writeln!(out, "{} {}", self.kind_name(), op)?;
                match inner {
                    Some(inner) => inner.describe(out, depth + 1),
                    None => Ok(()),
                }
            }
            FilterExpr::Afi { afis, inner } => {
                write!(out, "{}", self.kind_name())?;
                for afi in afis {
                    write!(out, " {afi}")?;
                }
                writeln!(out)?;
                inner.describe(out, depth + 1)
            }
            leaf => writeln!(out, "{} {}", leaf.kind_name(), leaf),
        }
    }

    /// Binding strength for canonical printing; higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            FilterExpr::Or { .. } => 1,
            FilterExpr::Except { .. } => 2,
            FilterExpr::And { .. } => 3,
            FilterExpr::Not(_) | FilterExpr::Afi { .. } => 4,
            FilterExpr::Hops { .. } => 5,
            _ => 6,
        }
    }

    /// Write `expr`, parenthesized when it binds looser than `min_prec`.
    fn fmt_operand(
        expr: &FilterExpr,
        min_prec: u8,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if expr.precedence() < min_prec {
            write!(f, "({expr})")
        } else {
            write!(f, "{expr}")
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Any => f.write_str("ANY"),
            FilterExpr::PeerAs => f.write_str("PeerAS"),
            FilterExpr::AsNum(asn) => write!(f, "AS{asn}"),
            FilterExpr::AsSet(name)
            | FilterExpr::RouteSet(name)
            | FilterExpr::RouterSet(name)
            | FilterExpr::FilterSet(name) => write!(f, "{name}"),
            FilterExpr::AsPath(re) => write!(f, "<{re}>"),
            FilterExpr::Prefixes(list) => write!(f, "{{{list}}}"),
            FilterExpr::MpPrefixes(list) => write!(f, "{{{list}}}"),
            FilterExpr::Not(inner) => {
                f.write_str("NOT ")?;
                FilterExpr::fmt_operand(inner, 4, f)
            }
            FilterExpr::And { left, right } => {
                FilterExpr::fmt_operand(left, 3, f)?;
                f.write_str(" AND ")?;
                FilterExpr::fmt_operand(right, 4, f)
            }
            FilterExpr::Or { left, right } => {
                FilterExpr::fmt_operand(left, 1, f)?;
                f.write_str(" OR ")?;
                FilterExpr::fmt_operand(right, 2, f)
            }
            FilterExpr::Except { left, right } => {
                FilterExpr::fmt_operand(left, 2, f)?;
                f.write_str(" EXCEPT ")?;
                FilterExpr::fmt_operand(right, 3, f)
            }
            FilterExpr::Hops { op, inner } => {
                if let Some(inner) = inner {
                    FilterExpr::fmt_operand(inner, 6, f)?;
                }
                write!(f, "{op}")
            }
            FilterExpr::Afi { afis, inner } => {
                f.write_str("afi ")?;
                for (i, afi) in afis.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{afi}")?;
                }
                f.write_str(" ")?;
                FilterExpr::fmt_operand(inner, 4, f)
            }
            FilterExpr::Call { attr, method, args } => {
                write!(f, "{attr}.{method}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            FilterExpr::HaveComponents(list) => write!(f, "HAVE-COMPONENTS {{{list}}}"),
            FilterExpr::ExcludeComponents(list) => write!(f, "EXCLUDE {{{list}}}"),
            FilterExpr::MpHaveComponents(list) => write!(f, "HAVE-COMPONENTS {{{list}}}"),
            FilterExpr::MpExcludeComponents(list) => write!(f, "EXCLUDE {{{list}}}"),
            FilterExpr::Router(prefix) => {
                if prefix.is_host() {
                    write!(f, "{}", prefix.addr())
                } else {
                    write!(f, "{prefix}")
                }
            }
            FilterExpr::RouterName(name) => f.write_str(name),
        }
    }
}
