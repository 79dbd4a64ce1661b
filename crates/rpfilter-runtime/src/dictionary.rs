//! Dictionary of named policy objects
//!
//! Filter trees hold symbolic names only; this module supplies the
//! capability they are resolved through at evaluation time. Definitions
//! may reference further sets by name, so expansion is recursive and
//! cycle-guarded by the evaluator.

use crate::error::Result;
use crate::route::RouteInfo;
use rpfilter_core::{Asn, FilterExpr, Item, MpPrefixRange, SetName};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// The kind of a named set; lookups are keyed by kind and name together,
/// so the four namespaces never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    AsSet,
    RouteSet,
    RouterSet,
    FilterSet,
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            SetKind::AsSet => "as-set",
            SetKind::RouteSet => "route-set",
            SetKind::RouterSet => "router-set",
            SetKind::FilterSet => "filter-set",
        };
        f.write_str(kind)
    }
}

/// One member of an as-set definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsSetMember {
    Asn(Asn),
    /// A nested as-set
    Set(SetName),
}

/// One member of a route-set definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSetMember {
    Prefix(MpPrefixRange),
    /// A nested route-set
    Set(SetName),
}

/// One member of a router-set definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterSetMember {
    Addr(IpAddr),
    /// A router DNS name
    Name(String),
    /// A nested router-set
    Set(SetName),
}

/// An as-set definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AsSetDef {
    pub members: Vec<AsSetMember>,
}

/// A route-set definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteSetDef {
    pub members: Vec<RouteSetMember>,
}

/// A router-set definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouterSetDef {
    pub members: Vec<RouterSetMember>,
}

/// A filter-set definition: a named filter expression
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSetDef {
    pub filter: FilterExpr,
}

/// A dictionary-resident definition
#[derive(Debug, Clone, PartialEq)]
pub enum SetDef {
    As(AsSetDef),
    Route(RouteSetDef),
    Router(RouterSetDef),
    Filter(FilterSetDef),
}

impl SetDef {
    pub fn kind(&self) -> SetKind {
        match self {
            SetDef::As(_) => SetKind::AsSet,
            SetDef::Route(_) => SetKind::RouteSet,
            SetDef::Router(_) => SetKind::RouterSet,
            SetDef::Filter(_) => SetKind::FilterSet,
        }
    }
}

/// A predicate registered under an RP-attribute method name.
///
/// Invoked at most once per evaluation of a `Call` node; implementations
/// must not mutate shared state the filter tree depends on.
pub trait RpMethod: Send + Sync {
    fn invoke(&self, route: &RouteInfo, peer_as: Option<Asn>, args: &[Item]) -> Result<bool>;
}

/// The resolution capability filter evaluation runs against.
pub trait Dictionary {
    /// Look up a set definition by kind and name
    fn lookup(&self, kind: SetKind, name: &str) -> Option<&SetDef>;

    /// Look up an RP-attribute method
    fn rp_method(&self, attr: &str, method: &str) -> Option<&dyn RpMethod>;

    /// Symbol normalization rule; name comparison belongs to the
    /// dictionary, not to the tree
    fn normalize(&self, name: &str) -> String {
        name.to_ascii_uppercase()
    }
}

/// A plain in-memory dictionary.
#[derive(Default)]
pub struct InMemoryDictionary {
    sets: HashMap<(SetKind, String), SetDef>,
    methods: HashMap<(String, String), Box<dyn RpMethod>>,
}

impl InMemoryDictionary {
    pub fn new() -> Self {
        InMemoryDictionary::default()
    }

    /// Insert a definition under its kind's namespace
    pub fn insert(&mut self, name: impl Into<String>, def: SetDef) {
        let name = name.into();
        let key = (def.kind(), self.normalize(&name));
        self.sets.insert(key, def);
    }

    pub fn insert_as_set(&mut self, name: impl Into<String>, members: Vec<AsSetMember>) {
        self.insert(name, SetDef::As(AsSetDef { members }));
    }

    pub fn insert_route_set(&mut self, name: impl Into<String>, members: Vec<RouteSetMember>) {
        self.insert(name, SetDef::Route(RouteSetDef { members }));
    }

    pub fn insert_router_set(&mut self, name: impl Into<String>, members: Vec<RouterSetMember>) {
        self.insert(name, SetDef::Router(RouterSetDef { members }));
    }

    pub fn insert_filter_set(&mut self, name: impl Into<String>, filter: FilterExpr) {
        self.insert(name, SetDef::Filter(FilterSetDef { filter }));
    }

    /// Register an RP-attribute method under `attr.method`
    pub fn register_method(
        &mut self,
        attr: impl Into<String>,
        method: impl Into<String>,
        imp: Box<dyn RpMethod>,
    ) {
        let key = (
            attr.into().to_ascii_lowercase(),
            method.into().to_ascii_lowercase(),
        );
        self.methods.insert(key, imp);
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl fmt::Debug for InMemoryDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDictionary")
            .field("sets", &self.sets.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

impl Dictionary for InMemoryDictionary {
    fn lookup(&self, kind: SetKind, name: &str) -> Option<&SetDef> {
        self.sets.get(&(kind, self.normalize(name)))
    }

    fn rp_method(&self, attr: &str, method: &str) -> Option<&dyn RpMethod> {
        self.methods
            .get(&(attr.to_ascii_lowercase(), method.to_ascii_lowercase()))
            .map(|m| m.as_ref())
    }
}
