//! Filter evaluation
//!
//! A read-only walk over the tree against a [`RouteInfo`] and a
//! [`Dictionary`]. Outcomes form a three-valued lattice: `Match`,
//! `NoMatch`, and `Unresolved` for names the dictionary cannot resolve.
//! A false operand dominates AND and a true operand dominates OR, so an
//! unresolved branch is absorbed where it cannot change the result;
//! everywhere else it surfaces to the caller as an error instead of being
//! coerced to no-match. Cyclic references and missing context abort
//! evaluation outright.

use crate::dictionary::{AsSetMember, Dictionary, RouteSetMember, RouterSetMember, SetDef, SetKind};
use crate::error::{EvalError, Result};
use crate::route::RouteInfo;
use rpfilter_core::{
    AsPath, Asn, CompiledPathRegex, FilterExpr, HopOp, MpPrefix, MpPrefixRange, PathRegex,
    PrefixRanges, SetName,
};
use std::collections::BTreeSet;
use std::net::IpAddr;
use tracing::{debug, trace};

/// Three-valued evaluation outcome.
#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Match,
    NoMatch,
    Unresolved(EvalError),
}

impl Outcome {
    fn from_bool(matched: bool) -> Self {
        if matched {
            Outcome::Match
        } else {
            Outcome::NoMatch
        }
    }

    /// AND lattice: a false operand dominates an unresolved one
    fn and(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Outcome::NoMatch, _) | (_, Outcome::NoMatch) => Outcome::NoMatch,
            (Outcome::Match, Outcome::Match) => Outcome::Match,
            (Outcome::Unresolved(e), _) | (_, Outcome::Unresolved(e)) => Outcome::Unresolved(e),
        }
    }

    /// OR lattice: a true operand dominates an unresolved one
    fn or(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Outcome::Match, _) | (_, Outcome::Match) => Outcome::Match,
            (Outcome::NoMatch, Outcome::NoMatch) => Outcome::NoMatch,
            (Outcome::Unresolved(e), _) | (_, Outcome::Unresolved(e)) => Outcome::Unresolved(e),
        }
    }

    fn not(self) -> Outcome {
        match self {
            Outcome::Match => Outcome::NoMatch,
            Outcome::NoMatch => Outcome::Match,
            unresolved => unresolved,
        }
    }
}

/// Names currently being expanded on the active call path.
#[derive(Debug, Default)]
struct ExpansionStack(Vec<(SetKind, String)>);

impl ExpansionStack {
    fn enter(&mut self, kind: SetKind, key: String, name: &str) -> Result<()> {
        if self.0.iter().any(|(k, n)| *k == kind && *n == key) {
            return Err(EvalError::CyclicReference {
                kind,
                name: name.to_string(),
            });
        }
        self.0.push((kind, key));
        Ok(())
    }

    fn leave(&mut self) {
        self.0.pop();
    }
}

fn mismatched_def(kind: SetKind, name: &SetName) -> EvalError {
    EvalError::MalformedTree {
        detail: format!("dictionary entry for {kind} {name} has the wrong kind"),
    }
}

fn first_hop_match(path: &AsPath, pred: impl Fn(Asn) -> bool) -> BTreeSet<usize> {
    match path.first_hop() {
        Some(hop) if pred(hop) => BTreeSet::from([1]),
        _ => BTreeSet::new(),
    }
}

fn v4_list_contains(list: &PrefixRanges, prefix: &MpPrefix) -> bool {
    match prefix.addr() {
        IpAddr::V4(addr) => list.contains(addr, prefix.length()),
        IpAddr::V6(_) => false,
    }
}

/// Evaluates filter trees against candidate routes.
pub struct Evaluator<'a> {
    dict: &'a dyn Dictionary,
    peer_as: Option<Asn>,
}

impl<'a> Evaluator<'a> {
    pub fn new(dict: &'a dyn Dictionary) -> Self {
        Evaluator { dict, peer_as: None }
    }

    /// Supply the peering context the `PeerAS` marker resolves against
    pub fn with_peer_as(mut self, peer_as: Asn) -> Self {
        self.peer_as = Some(peer_as);
        self
    }

    /// Evaluate `filter` against `route`.
    ///
    /// Returns `Ok(true)`/`Ok(false)` for a decided filter; an unresolved
    /// reference that survives dominance is an error, never a no-match.
    pub fn evaluate(&self, filter: &FilterExpr, route: &RouteInfo) -> Result<bool> {
        let mut stack = ExpansionStack::default();
        let outcome = self.eval(filter, route, &mut stack)?;
        debug!(filter = %filter, ?outcome, "filter evaluated");
        match outcome {
            Outcome::Match => Ok(true),
            Outcome::NoMatch => Ok(false),
            Outcome::Unresolved(e) => Err(e),
        }
    }

    /// Validate a route object's own component prefixes against a
    /// `HAVE-COMPONENTS` / `EXCLUDE` filter.
    pub fn evaluate_components(
        &self,
        filter: &FilterExpr,
        components: &[MpPrefix],
    ) -> Result<bool> {
        match self.eval_components(filter, components)? {
            Outcome::Match => Ok(true),
            Outcome::NoMatch => Ok(false),
            Outcome::Unresolved(e) => Err(e),
        }
    }

    fn eval(
        &self,
        filter: &FilterExpr,
        route: &RouteInfo,
        stack: &mut ExpansionStack,
    ) -> Result<Outcome> {
        let outcome = match filter {
            FilterExpr::Any => Outcome::Match,
            FilterExpr::PeerAs => {
                let peer = self.peer_as.ok_or(EvalError::ContextMissing { what: "PeerAS" })?;
                Outcome::from_bool(route.origin == peer)
            }
            FilterExpr::AsNum(asn) => Outcome::from_bool(route.origin == *asn),
            FilterExpr::AsSet(name) => {
                self.leaf(self.as_set_contains(name, route.origin, stack))?
            }
            FilterExpr::RouteSet(name) => {
                self.leaf(self.route_set_contains(name, &route.prefix, stack))?
            }
            FilterExpr::RouterSet(name) => {
                self.leaf(self.router_set_contains(name, route, stack))?
            }
            FilterExpr::FilterSet(name) => self.eval_filter_set(name, route, stack)?,
            FilterExpr::AsPath(re) => {
                Outcome::from_bool(self.compile(re)?.is_match(&route.as_path))
            }
            FilterExpr::Prefixes(list) => {
                Outcome::from_bool(v4_list_contains(list, &route.prefix))
            }
            FilterExpr::MpPrefixes(list) => Outcome::from_bool(list.contains(&route.prefix)),
            FilterExpr::Not(inner) => self.eval(inner, route, stack)?.not(),
            FilterExpr::And { left, right } => match self.eval(left, route, stack)? {
                // short-circuit: a false operand already decides AND
                Outcome::NoMatch => Outcome::NoMatch,
                l => l.and(self.eval(right, route, stack)?),
            },
            FilterExpr::Or { left, right } => match self.eval(left, route, stack)? {
                // short-circuit: a true operand already decides OR
                Outcome::Match => Outcome::Match,
                l => l.or(self.eval(right, route, stack)?),
            },
            FilterExpr::Except { left, right } => match self.eval(left, route, stack)? {
                // EXCEPT is AND(left, NOT right)
                Outcome::NoMatch => Outcome::NoMatch,
                l => l.and(self.eval(right, route, stack)?.not()),
            },
            FilterExpr::Hops { op, inner } => {
                self.eval_hops(*op, inner.as_deref(), &route.as_path, stack)?
            }
            FilterExpr::Afi { afis, inner } => {
                if afis.iter().any(|afi| afi.covers(route.afi)) {
                    self.eval(inner, route, stack)?
                } else {
                    // out-of-family routes are vacuously non-matching
                    Outcome::NoMatch
                }
            }
            FilterExpr::Call { attr, method, args } => match self.dict.rp_method(attr, method) {
                Some(imp) => Outcome::from_bool(imp.invoke(route, self.peer_as, args)?),
                None => Outcome::Unresolved(EvalError::UnresolvedMethod {
                    attr: attr.clone(),
                    method: method.clone(),
                }),
            },
            FilterExpr::Router(prefix) => {
                Outcome::from_bool(route.router == Some(prefix.addr()))
            }
            FilterExpr::RouterName(name) => Outcome::from_bool(
                route
                    .router_name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name)),
            ),
            FilterExpr::HaveComponents(_)
            | FilterExpr::ExcludeComponents(_)
            | FilterExpr::MpHaveComponents(_)
            | FilterExpr::MpExcludeComponents(_) => {
                return Err(EvalError::ContextMissing { what: "component filter" })
            }
        };
        Ok(outcome)
    }

    /// Map a leaf resolution result into the outcome lattice: unresolved
    /// references become `Unresolved`, hard errors propagate.
    fn leaf(&self, resolved: Result<bool>) -> Result<Outcome> {
        match resolved {
            Ok(matched) => Ok(Outcome::from_bool(matched)),
            Err(e) if e.is_unresolved() => Ok(Outcome::Unresolved(e)),
            Err(e) => Err(e),
        }
    }

    fn compile(&self, re: &PathRegex) -> Result<CompiledPathRegex> {
        // patterns are validated at construction, so this cannot fail for
        // a tree built by the parser
        re.compile().map_err(|e| EvalError::MalformedTree {
            detail: e.to_string(),
        })
    }

    fn eval_filter_set(
        &self,
        name: &SetName,
        route: &RouteInfo,
        stack: &mut ExpansionStack,
    ) -> Result<Outcome> {
        stack.enter(SetKind::FilterSet, self.dict.normalize(name.as_str()), name.as_str())?;
        trace!(name = %name, "expanding filter-set");
        let outcome = match self.dict.lookup(SetKind::FilterSet, name.as_str()) {
            Some(SetDef::Filter(def)) => self.eval(&def.filter, route, stack)?,
            Some(_) => return Err(mismatched_def(SetKind::FilterSet, name)),
            None => Outcome::Unresolved(EvalError::UnresolvedReference {
                kind: SetKind::FilterSet,
                name: name.to_string(),
            }),
        };
        stack.leave();
        Ok(outcome)
    }

    fn as_set_contains(
        &self,
        name: &SetName,
        asn: Asn,
        stack: &mut ExpansionStack,
    ) -> Result<bool> {
        let mut members = BTreeSet::new();
        self.collect_as_set(name, stack, &mut members)?;
        Ok(members.contains(&asn))
    }

    fn collect_as_set(
        &self,
        name: &SetName,
        stack: &mut ExpansionStack,
        acc: &mut BTreeSet<Asn>,
    ) -> Result<()> {
        stack.enter(SetKind::AsSet, self.dict.normalize(name.as_str()), name.as_str())?;
        let def = self
            .dict
            .lookup(SetKind::AsSet, name.as_str())
            .ok_or_else(|| EvalError::UnresolvedReference {
                kind: SetKind::AsSet,
                name: name.to_string(),
            })?;
        let SetDef::As(def) = def else {
            return Err(mismatched_def(SetKind::AsSet, name));
        };
        for member in &def.members {
            match member {
                AsSetMember::Asn(asn) => {
                    acc.insert(*asn);
                }
                AsSetMember::Set(inner) => self.collect_as_set(inner, stack, acc)?,
            }
        }
        stack.leave();
        Ok(())
    }

    fn route_set_contains(
        &self,
        name: &SetName,
        prefix: &MpPrefix,
        stack: &mut ExpansionStack,
    ) -> Result<bool> {
        let mut entries = Vec::new();
        self.collect_route_set(name, stack, &mut entries)?;
        Ok(entries.iter().any(|entry| entry.contains(prefix)))
    }

    fn collect_route_set(
        &self,
        name: &SetName,
        stack: &mut ExpansionStack,
        acc: &mut Vec<MpPrefixRange>,
    ) -> Result<()> {
        stack.enter(SetKind::RouteSet, self.dict.normalize(name.as_str()), name.as_str())?;
        let def = self
            .dict
            .lookup(SetKind::RouteSet, name.as_str())
            .ok_or_else(|| EvalError::UnresolvedReference {
                kind: SetKind::RouteSet,
                name: name.to_string(),
            })?;
        let SetDef::Route(def) = def else {
            return Err(mismatched_def(SetKind::RouteSet, name));
        };
        for member in &def.members {
            match member {
                RouteSetMember::Prefix(range) => acc.push(*range),
                RouteSetMember::Set(inner) => self.collect_route_set(inner, stack, acc)?,
            }
        }
        stack.leave();
        Ok(())
    }

    fn router_set_contains(
        &self,
        name: &SetName,
        route: &RouteInfo,
        stack: &mut ExpansionStack,
    ) -> Result<bool> {
        let mut addrs = BTreeSet::new();
        let mut names = BTreeSet::new();
        self.collect_router_set(name, stack, &mut addrs, &mut names)?;
        let by_addr = route.router.map(|addr| addrs.contains(&addr)).unwrap_or(false);
        let by_name = route
            .router_name
            .as_deref()
            .map(|n| names.contains(&n.to_ascii_lowercase()))
            .unwrap_or(false);
        Ok(by_addr || by_name)
    }

    fn collect_router_set(
        &self,
        name: &SetName,
        stack: &mut ExpansionStack,
        addrs: &mut BTreeSet<IpAddr>,
        names: &mut BTreeSet<String>,
    ) -> Result<()> {
        stack.enter(SetKind::RouterSet, self.dict.normalize(name.as_str()), name.as_str())?;
        let def = self
            .dict
            .lookup(SetKind::RouterSet, name.as_str())
            .ok_or_else(|| EvalError::UnresolvedReference {
                kind: SetKind::RouterSet,
                name: name.to_string(),
            })?;
        let SetDef::Router(def) = def else {
            return Err(mismatched_def(SetKind::RouterSet, name));
        };
        for member in &def.members {
            match member {
                RouterSetMember::Addr(addr) => {
                    addrs.insert(*addr);
                }
                RouterSetMember::Name(n) => {
                    names.insert(n.to_ascii_lowercase());
                }
                RouterSetMember::Set(inner) => {
                    self.collect_router_set(inner, stack, addrs, names)?
                }
            }
        }
        stack.leave();
        Ok(())
    }

    fn eval_hops(
        &self,
        op: HopOp,
        inner: Option<&FilterExpr>,
        path: &AsPath,
        stack: &mut ExpansionStack,
    ) -> Result<Outcome> {
        let lengths = match inner {
            // no inner filter: the constraint applies from the path start
            None => BTreeSet::from([0usize]),
            Some(filter) => match self.hop_match_lengths(filter, path, stack) {
                Ok(lengths) => lengths,
                Err(e) if e.is_unresolved() => return Ok(Outcome::Unresolved(e)),
                Err(e) => return Err(e),
            },
        };
        let total = path.len();
        let admitted = lengths.iter().any(|&k| op.admits((total - k) as u32));
        Ok(Outcome::from_bool(admitted))
    }

    /// The set of path-prefix lengths at which `filter` matches. Only
    /// matchers over path positions are legal under a hop-count operator.
    fn hop_match_lengths(
        &self,
        filter: &FilterExpr,
        path: &AsPath,
        stack: &mut ExpansionStack,
    ) -> Result<BTreeSet<usize>> {
        let all = || (0..=path.len()).collect::<BTreeSet<usize>>();
        match filter {
            FilterExpr::Any => Ok(all()),
            FilterExpr::AsNum(asn) => Ok(first_hop_match(path, |hop| hop == *asn)),
            FilterExpr::PeerAs => {
                let peer = self.peer_as.ok_or(EvalError::ContextMissing { what: "PeerAS" })?;
                Ok(first_hop_match(path, |hop| hop == peer))
            }
            FilterExpr::AsSet(name) => {
                let mut members = BTreeSet::new();
                self.collect_as_set(name, stack, &mut members)?;
                Ok(first_hop_match(path, |hop| members.contains(&hop)))
            }
            FilterExpr::AsPath(re) => Ok(self.compile(re)?.match_lengths(path)),
            FilterExpr::FilterSet(name) => {
                stack.enter(SetKind::FilterSet, self.dict.normalize(name.as_str()), name.as_str())?;
                let def = self
                    .dict
                    .lookup(SetKind::FilterSet, name.as_str())
                    .ok_or_else(|| EvalError::UnresolvedReference {
                        kind: SetKind::FilterSet,
                        name: name.to_string(),
                    })?;
                let SetDef::Filter(def) = def else {
                    return Err(mismatched_def(SetKind::FilterSet, name));
                };
                let lengths = self.hop_match_lengths(&def.filter, path, stack)?;
                stack.leave();
                Ok(lengths)
            }
            FilterExpr::And { left, right } => {
                let l = self.hop_match_lengths(left, path, stack)?;
                let r = self.hop_match_lengths(right, path, stack)?;
                Ok(l.intersection(&r).copied().collect())
            }
            FilterExpr::Or { left, right } => {
                let l = self.hop_match_lengths(left, path, stack)?;
                let r = self.hop_match_lengths(right, path, stack)?;
                Ok(l.union(&r).copied().collect())
            }
            FilterExpr::Not(inner) => {
                let inner = self.hop_match_lengths(inner, path, stack)?;
                Ok(all().difference(&inner).copied().collect())
            }
            FilterExpr::Except { left, right } => {
                let l = self.hop_match_lengths(left, path, stack)?;
                let r = self.hop_match_lengths(right, path, stack)?;
                Ok(l.difference(&r).copied().collect())
            }
            other => Err(EvalError::MalformedTree {
                detail: format!("{} is not an AS-path matcher", other.kind_name()),
            }),
        }
    }

    fn eval_components(
        &self,
        filter: &FilterExpr,
        components: &[MpPrefix],
    ) -> Result<Outcome> {
        let outcome = match filter {
            FilterExpr::Any => Outcome::Match,
            FilterExpr::Not(inner) => self.eval_components(inner, components)?.not(),
            FilterExpr::And { left, right } => match self.eval_components(left, components)? {
                Outcome::NoMatch => Outcome::NoMatch,
                l => l.and(self.eval_components(right, components)?),
            },
            FilterExpr::Or { left, right } => match self.eval_components(left, components)? {
                Outcome::Match => Outcome::Match,
                l => l.or(self.eval_components(right, components)?),
            },
            FilterExpr::Except { left, right } => {
                match self.eval_components(left, components)? {
                    Outcome::NoMatch => Outcome::NoMatch,
                    l => l.and(self.eval_components(right, components)?.not()),
                }
            }
            FilterExpr::HaveComponents(list) => Outcome::from_bool(
                components.iter().all(|p| v4_list_contains(list, p)),
            ),
            FilterExpr::ExcludeComponents(list) => Outcome::from_bool(
                !components.iter().any(|p| v4_list_contains(list, p)),
            ),
            FilterExpr::MpHaveComponents(list) => {
                Outcome::from_bool(components.iter().all(|p| list.contains(p)))
            }
            FilterExpr::MpExcludeComponents(list) => {
                Outcome::from_bool(!components.iter().any(|p| list.contains(p)))
            }
            _ => {
                return Err(EvalError::ContextMissing {
                    what: "route filter inside component validation",
                })
            }
        };
        Ok(outcome)
    }
}
