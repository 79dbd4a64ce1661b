//! Unit tests for the filter parser
//!
//! The central property: printing any parsed tree and parsing it again
//! yields a structurally equal tree.

use rpfilter_core::FilterExpr;
use rpfilter_parser::parse;

// =============================================================================
// Round-trip property
// =============================================================================

/// parse → print → parse must be a fixed point, and the second print must
/// equal the first (canonical form is stable).
fn assert_round_trip(input: &str) {
    let tree = parse(input).unwrap_or_else(|e| panic!("parse failed for '{input}': {e}"));
    let printed = tree.to_string();
    let reparsed =
        parse(&printed).unwrap_or_else(|e| panic!("reparse failed for '{printed}': {e}"));
    assert_eq!(reparsed, tree, "round trip changed the tree for '{input}'");
    assert_eq!(reparsed.to_string(), printed, "printing is not stable for '{input}'");
}

#[test]
fn test_round_trip_corpus() {
    let corpus = [
        "ANY",
        "PeerAS",
        "AS64500",
        "AS-CUSTOMERS",
        "AS64500:AS-CUSTOMERS",
        "RS-MARTIANS",
        "RTRS-EDGE",
        "FLTR-BOGONS",
        "NOT AS1",
        "NOT NOT AS1",
        "AS1 AND AS2",
        "AS1 OR AS2",
        "AS1 EXCEPT AS2",
        "AS1 AND AS2 OR AS3",
        "(AS1 OR AS2) AND AS3",
        "AS1 OR (AS2 OR AS3)",
        "AS1 AND NOT (AS2 OR AS3)",
        "AS-CUSTOMERS AND NOT RS-MARTIANS OR <^AS64500 .* AS64510$> EXCEPT AS64499",
        "<^AS1 AS2$>",
        "<AS1 | AS2>",
        "<[AS1 AS2] AS3+>",
        "{}",
        "{10.0.0.0/8}",
        "{10.0.0.0/8^+, 192.168.0.0/16^-, 172.16.0.0/12^16-24, 203.0.113.0/24^28}",
        "{10.0.0.0/8, 2001:db8::/32^+}",
        "{2001:db8::/32^48}",
        "AS-CUST^+",
        "AS-CUST^-",
        "AS-CUST^2",
        "AS-CUST^2-4",
        "^+",
        "(AS1 AND AS2)^1-3",
        "<^AS1 AS2$>^+",
        "afi ipv4.unicast AS-CUST",
        "afi ipv4.unicast, ipv6.unicast (AS1 AND AS2)",
        "afi any NOT RS-MARTIANS",
        "HAVE-COMPONENTS {10.0.0.0/8^+}",
        "EXCLUDE {10.64.0.0/10}",
        "HAVE-COMPONENTS {2001:db8::/32^+}",
        "EXCLUDE {2001:db8::/32, 10.0.0.0/8}",
        "community.contains(65000:100)",
        "pref.set(10)",
        "aspath.originates(AS64500)",
        "rpki.valid(\"strict\")",
        "192.0.2.1",
        "2001:db8::1",
        "edge1.example.net",
        "192.0.2.1 OR edge1.example.net",
        "afi ipv6.unicast ({2001:db8::/32^+} AND <AS64500$>)",
    ];
    for input in corpus {
        assert_round_trip(input);
    }
}

// =============================================================================
// Canonicalization
// =============================================================================

#[test]
fn test_noncanonical_input_normalizes() {
    // keyword case, spacing, and redundant parentheses normalize away
    let tree = parse("( as1 and as2 ) or not as3").unwrap();
    assert_eq!(tree.to_string(), "AS1 AND AS2 OR NOT AS3");
    assert_round_trip("( as1 and as2 ) or not as3");
}

#[test]
fn test_prefix_entry_operators_normalize() {
    // an explicit range equal to ^+ prints as ^+
    let tree = parse("{10.0.0.0/8^8-32}").unwrap();
    assert_eq!(tree.to_string(), "{10.0.0.0/8^+}");
}

#[test]
fn test_v4_only_list_parses_to_v4_variant() {
    let tree = parse("{10.0.0.0/8, 192.168.0.0/16}").unwrap();
    assert!(matches!(tree, FilterExpr::Prefixes(_)));
}

// =============================================================================
// Rejection cases
// =============================================================================

#[test]
fn test_malformed_inputs_rejected() {
    for input in [
        "",
        "AND AS1",
        "AS1 OR",
        "(AS1 AND AS2",
        "{10.0.0.0/8",
        "{10.0.0.1/8}",      // host bits set
        "{10.0.0.0/8^4-16}", // bound below block length
        "<[^AS1]>",          // negated AS set
        "AS1 ^4-2",          // inverted hop range
        "plainword",
        "AS1 AS2",
    ] {
        assert!(parse(input).is_err(), "expected parse failure for '{input}'");
    }
}
