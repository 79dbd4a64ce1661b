//! YAML dictionary documents
//!
//! Loads named-set definitions from a YAML document:
//!
//! ```yaml
//! as-sets:
//!   AS-CUSTOMERS:
//!     members: [AS64500, AS64501, AS-PEERS]
//! route-sets:
//!   RS-MARTIANS:
//!     members: ["10.0.0.0/8^+", "192.168.0.0/16^+"]
//! router-sets:
//!   RTRS-EDGE:
//!     members: ["192.0.2.1", "edge1.example.net"]
//! filter-sets:
//!   FLTR-CLEAN:
//!     filter: "NOT RS-MARTIANS"
//! ```
//!
//! Filter-set bodies are canonical filter text, parsed with
//! `rpfilter-parser`. Members may name further sets of the same kind.

use crate::dictionary::{AsSetMember, InMemoryDictionary, RouteSetMember, RouterSetMember, SetKind};
use crate::error::LoadError;
use rpfilter_core::{MpPrefixRange, SetName};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DictionaryDoc {
    #[serde(default, rename = "as-sets")]
    as_sets: BTreeMap<String, MembersDoc>,
    #[serde(default, rename = "route-sets")]
    route_sets: BTreeMap<String, MembersDoc>,
    #[serde(default, rename = "router-sets")]
    router_sets: BTreeMap<String, MembersDoc>,
    #[serde(default, rename = "filter-sets")]
    filter_sets: BTreeMap<String, FilterDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MembersDoc {
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterDoc {
    filter: String,
}

/// Load an [`InMemoryDictionary`] from a YAML document.
pub fn load_dictionary(yaml: &str) -> Result<InMemoryDictionary, LoadError> {
    let doc: DictionaryDoc = serde_yaml::from_str(yaml)?;
    let mut dict = InMemoryDictionary::new();

    for (name, members) in &doc.as_sets {
        let members = members
            .members
            .iter()
            .map(|member| parse_as_member(name, member))
            .collect::<Result<Vec<_>, _>>()?;
        dict.insert_as_set(name, members);
    }

    for (name, members) in &doc.route_sets {
        let members = members
            .members
            .iter()
            .map(|member| parse_route_member(name, member))
            .collect::<Result<Vec<_>, _>>()?;
        dict.insert_route_set(name, members);
    }

    for (name, members) in &doc.router_sets {
        let members = members
            .members
            .iter()
            .map(|member| parse_router_member(member))
            .collect::<Vec<_>>();
        dict.insert_router_set(name, members);
    }

    for (name, body) in &doc.filter_sets {
        let filter = rpfilter_parser::parse(&body.filter).map_err(|e| LoadError::Filter {
            name: name.clone(),
            source: e,
        })?;
        dict.insert_filter_set(name, filter);
    }

    debug!(sets = dict.len(), "dictionary loaded");
    Ok(dict)
}

fn is_set_name(member: &str, reserved: &str) -> bool {
    member
        .to_ascii_uppercase()
        .split(':')
        .any(|component| component.starts_with(reserved))
}

fn parse_as_member(set: &str, member: &str) -> Result<AsSetMember, LoadError> {
    let member = member.trim();
    let upper = member.to_ascii_uppercase();
    if let Some(digits) = upper.strip_prefix("AS") {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(asn) = digits.parse() {
                return Ok(AsSetMember::Asn(asn));
            }
        }
    }
    if is_set_name(member, "AS-") {
        return Ok(AsSetMember::Set(SetName::new(member)));
    }
    Err(LoadError::Member {
        kind: SetKind::AsSet,
        name: set.to_string(),
        member: member.to_string(),
    })
}

fn parse_route_member(set: &str, member: &str) -> Result<RouteSetMember, LoadError> {
    let member = member.trim();
    if let Ok(range) = member.parse::<MpPrefixRange>() {
        return Ok(RouteSetMember::Prefix(range));
    }
    if is_set_name(member, "RS-") {
        return Ok(RouteSetMember::Set(SetName::new(member)));
    }
    Err(LoadError::Member {
        kind: SetKind::RouteSet,
        name: set.to_string(),
        member: member.to_string(),
    })
}

fn parse_router_member(member: &str) -> RouterSetMember {
    let member = member.trim();
    if let Ok(addr) = member.parse::<IpAddr>() {
        return RouterSetMember::Addr(addr);
    }
    if is_set_name(member, "RTRS-") {
        return RouterSetMember::Set(SetName::new(member));
    }
    // anything else is a router DNS name
    RouterSetMember::Name(member.to_string())
}
