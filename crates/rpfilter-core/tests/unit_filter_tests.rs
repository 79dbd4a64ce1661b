//! Unit tests for the filter expression tree
//!
//! Tree-level properties: clone independence, canonical printing of
//! nested expressions, projections, serde round-trips.

use rpfilter_core::{Afi, FilterExpr, HopOp, Item, MpPrefixRanges, PathRegex, PrefixRanges};

// =============================================================================
// Construction and printing
// =============================================================================

#[test]
fn test_nested_expression_prints_canonically() {
    let expr = FilterExpr::or(
        FilterExpr::and(
            FilterExpr::as_set("AS-CUSTOMERS"),
            FilterExpr::not(FilterExpr::route_set("RS-MARTIANS")),
        ),
        FilterExpr::except(
            FilterExpr::AsPath(PathRegex::new("^AS64500 .* AS64510$").unwrap()),
            FilterExpr::AsNum(64499),
        ),
    );
    assert_eq!(
        expr.to_string(),
        "AS-CUSTOMERS AND NOT RS-MARTIANS OR <^AS64500 .* AS64510$> EXCEPT AS64499"
    );
}

#[test]
fn test_component_nodes_print() {
    let v4: PrefixRanges = "10.0.0.0/8^+".parse().unwrap();
    assert_eq!(
        FilterExpr::HaveComponents(v4.clone()).to_string(),
        "HAVE-COMPONENTS {10.0.0.0/8^+}"
    );
    assert_eq!(
        FilterExpr::ExcludeComponents(v4).to_string(),
        "EXCLUDE {10.0.0.0/8^+}"
    );

    let mp: MpPrefixRanges = "2001:db8::/32^-".parse().unwrap();
    assert_eq!(
        FilterExpr::MpHaveComponents(mp).to_string(),
        "HAVE-COMPONENTS {2001:db8::/32^-}"
    );
}

#[test]
fn test_empty_prefix_list_prints_braces() {
    assert_eq!(FilterExpr::Prefixes(PrefixRanges::new()).to_string(), "{}");
}

// =============================================================================
// Clone independence
// =============================================================================

#[test]
fn test_clone_shares_nothing_with_original() {
    let original = FilterExpr::afi(
        vec![Afi::Ipv4Unicast],
        FilterExpr::hops(
            HopOp::between(1, 3).unwrap(),
            Some(FilterExpr::as_set("AS-CUST")),
        ),
    );
    let copy = original.clone();
    let printed = original.to_string();

    // consume the original into a larger tree; the clone is unaffected
    let _rebuilt = FilterExpr::and(original, FilterExpr::Any);
    assert_eq!(copy.to_string(), printed);
}

#[test]
fn test_clone_copies_symbol_handles_by_value() {
    let original = FilterExpr::filter_set("FLTR-BOGONS");
    let copy = original.clone();
    match (original, copy) {
        (FilterExpr::FilterSet(a), FilterExpr::FilterSet(b)) => assert_eq!(a, b),
        _ => panic!("expected filter-set references"),
    }
}

// =============================================================================
// Multiprotocol projections
// =============================================================================

#[test]
fn test_projection_partitions_mixed_list() {
    let list: MpPrefixRanges = "10.0.0.0/8^+, 2001:db8::/32, 172.16.0.0/12^14-20"
        .parse()
        .unwrap();

    let v4 = list.project_v4();
    let v6 = list.project_v6();
    assert_eq!(v4.len() + v6.len(), list.len());
    assert_eq!(v4.to_string(), "10.0.0.0/8^+, 172.16.0.0/12^14-20");
    assert_eq!(v6.to_string(), "2001:db8::/32");
    // idempotent
    assert_eq!(v6.project_v6(), v6);
}

// =============================================================================
// Serde
// =============================================================================

#[test]
fn test_full_tree_serde_round_trip() -> anyhow::Result<()> {
    let expr = FilterExpr::or(
        FilterExpr::Call {
            attr: "community".to_string(),
            method: "contains".to_string(),
            args: vec![Item::Word("65000:100".to_string())],
        },
        FilterExpr::afi(
            vec![Afi::Ipv6Unicast],
            FilterExpr::MpPrefixes("2001:db8::/32^+".parse()?),
        ),
    );
    let json = serde_json::to_string(&expr)?;
    let back: FilterExpr = serde_json::from_str(&json)?;
    assert_eq!(back, expr);
    Ok(())
}

#[test]
fn test_invalid_path_regex_rejected_on_deserialize() {
    let err = serde_json::from_str::<PathRegex>("\"[^AS1]\"");
    assert!(err.is_err());
}
