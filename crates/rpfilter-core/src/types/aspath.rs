//! AS paths and AS-path regular expressions
//!
//! The pattern alphabet is AS numbers, one symbol per hop. Patterns are
//! kept in their textual form on the tree and translated to `regex`
//! patterns over a token rendering of the path (`"AS64500 AS64501 "`).
//! Every translated atom consumes one whole `AS<n> ` token, so matches can
//! only start and end on hop boundaries.
//!
//! Supported syntax: AS numbers, `.` (any hop), AS sets `[AS1 AS2]`,
//! grouping, alternation, `*` `+` `?`, and the `^`/`$` anchors. Negated
//! sets and `~`-repetition are rejected at construction.

use crate::error::CoreError;
use crate::types::Asn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An ordered sequence of AS numbers, nearest hop first, origin last.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AsPath(Vec<Asn>);

impl AsPath {
    pub fn new(hops: Vec<Asn>) -> Self {
        AsPath(hops)
    }

    pub fn hops(&self) -> &[Asn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The originating AS (last hop), if the path is non-empty
    pub fn origin(&self) -> Option<Asn> {
        self.0.last().copied()
    }

    /// The first (nearest) hop, if any
    pub fn first_hop(&self) -> Option<Asn> {
        self.0.first().copied()
    }

    pub fn contains(&self, asn: Asn) -> bool {
        self.0.contains(&asn)
    }

    /// Token rendering of the first `k` hops, used by the regex engine
    fn render_prefix(&self, k: usize) -> String {
        let mut out = String::new();
        for asn in &self.0[..k] {
            out.push_str("AS");
            out.push_str(&asn.to_string());
            out.push(' ');
        }
        out
    }

    fn render(&self) -> String {
        self.render_prefix(self.0.len())
    }
}

impl From<Vec<Asn>> for AsPath {
    fn from(hops: Vec<Asn>) -> Self {
        AsPath(hops)
    }
}

impl fmt::Display for AsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, asn) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "AS{asn}")?;
        }
        Ok(())
    }
}

/// An AS-path regular expression in textual form.
///
/// The pattern is validated (translated and compiled) at construction and
/// kept verbatim for canonical printing; [`compile`](Self::compile)
/// produces the matcher used at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathRegex {
    pattern: String,
}

impl PathRegex {
    /// Validate and store a pattern
    pub fn new(pattern: impl Into<String>) -> Result<Self, CoreError> {
        let pattern = pattern.into().trim().to_string();
        compile_pattern(&pattern)?;
        Ok(PathRegex { pattern })
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Compile to a matcher over AS paths
    pub fn compile(&self) -> Result<CompiledPathRegex, CoreError> {
        compile_pattern(&self.pattern)
    }
}

impl fmt::Display for PathRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl TryFrom<String> for PathRegex {
    type Error = CoreError;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        PathRegex::new(pattern)
    }
}

impl From<PathRegex> for String {
    fn from(re: PathRegex) -> Self {
        re.pattern
    }
}

/// A compiled AS-path matcher.
#[derive(Debug, Clone)]
pub struct CompiledPathRegex {
    search: Regex,
    exact: Regex,
}

impl CompiledPathRegex {
    /// Does the pattern match some window of the path?
    pub fn is_match(&self, path: &AsPath) -> bool {
        self.search.is_match(&path.render())
    }

    /// The set of `k` for which the pattern matches exactly the first `k`
    /// hops of the path. Used for hop-count constraints.
    pub fn match_lengths(&self, path: &AsPath) -> BTreeSet<usize> {
        (0..=path.len())
            .filter(|&k| self.exact.is_match(&path.render_prefix(k)))
            .collect()
    }
}

fn compile_pattern(pattern: &str) -> Result<CompiledPathRegex, CoreError> {
    let translated = translate(pattern)?;
    let fail = |e: regex::Error| CoreError::InvalidPathRegex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    };
    let search = Regex::new(&translated).map_err(fail)?;
    let exact = Regex::new(&format!(r"\A(?:{translated})\z")).map_err(fail)?;
    Ok(CompiledPathRegex { search, exact })
}

/// Translate an AS-path pattern into a `regex` pattern over the token
/// rendering. Atoms emit self-contained groups ending in the token
/// separator, so postfix repetition applies to whole hops.
fn translate(pattern: &str) -> Result<String, CoreError> {
    let err = |reason: &str| CoreError::InvalidPathRegex {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };
    let mut out = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' => {}
            '^' => out.push_str(r"\A"),
            '$' => out.push_str(r"\z"),
            '(' => out.push_str("(?:"),
            ')' | '|' | '*' | '+' | '?' => out.push(c),
            '.' => out.push_str("(?:AS[0-9]+ )"),
            'A' | 'a' => {
                if !matches!(chars.next(), Some('S') | Some('s')) {
                    return Err(err("expected AS number"));
                }
                let asn = read_asn(&mut chars).ok_or_else(|| err("expected AS number"))?;
                out.push_str(&format!("(?:AS{asn} )"));
            }
            '[' => {
                let mut members: Vec<Asn> = Vec::new();
                loop {
                    match chars.peek() {
                        None => return Err(err("unterminated AS set")),
                        Some(']') => {
                            chars.next();
                            break;
                        }
                        Some(' ') | Some('\t') | Some(',') => {
                            chars.next();
                        }
                        Some('^') => return Err(err("negated AS sets are not supported")),
                        Some('-') => return Err(err("AS ranges in sets are not supported")),
                        Some('A') | Some('a') => {
                            chars.next();
                            if !matches!(chars.next(), Some('S') | Some('s')) {
                                return Err(err("expected AS number in set"));
                            }
                            let asn = read_asn(&mut chars)
                                .ok_or_else(|| err("expected AS number in set"))?;
                            members.push(asn);
                        }
                        Some(_) => return Err(err("expected AS number in set")),
                    }
                }
                if members.is_empty() {
                    return Err(err("empty AS set"));
                }
                let alts = members
                    .iter()
                    .map(|asn| format!("AS{asn}"))
                    .collect::<Vec<_>>()
                    .join("|");
                out.push_str(&format!("(?:(?:{alts}) )"));
            }
            '~' => return Err(err("~ repetition is not supported")),
            _ => return Err(err("unexpected character")),
        }
    }
    Ok(out)
}

fn read_asn(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<Asn> {
    let mut digits = String::new();
    while let Some(c) = chars.peek() {
        if c.is_ascii_digit() {
            digits.push(*c);
            chars.next();
        } else {
            break;
        }
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(hops: &[Asn]) -> AsPath {
        AsPath::new(hops.to_vec())
    }

    fn re(pattern: &str) -> CompiledPathRegex {
        PathRegex::new(pattern).unwrap().compile().unwrap()
    }

    #[test]
    fn test_literal_window_match() {
        let m = re("AS2 AS3");
        assert!(m.is_match(&path(&[1, 2, 3, 4])));
        assert!(!m.is_match(&path(&[1, 2, 4])));
    }

    #[test]
    fn test_no_partial_token_match() {
        // AS1 must not match inside AS11 or AS21
        let m = re("AS1");
        assert!(!m.is_match(&path(&[11, 21, 112])));
        assert!(m.is_match(&path(&[11, 1, 112])));
    }

    #[test]
    fn test_anchors() {
        let start = re("^AS1");
        assert!(start.is_match(&path(&[1, 2])));
        assert!(!start.is_match(&path(&[2, 1])));

        let origin = re("AS2$");
        assert!(origin.is_match(&path(&[1, 2])));
        assert!(!origin.is_match(&path(&[2, 1])));

        let whole = re("^AS1 AS2$");
        assert!(whole.is_match(&path(&[1, 2])));
        assert!(!whole.is_match(&path(&[1, 2, 3])));
    }

    #[test]
    fn test_wildcard_and_repetition() {
        let m = re("^AS1 .* AS5$");
        assert!(m.is_match(&path(&[1, 5])));
        assert!(m.is_match(&path(&[1, 9, 9, 5])));
        assert!(!m.is_match(&path(&[2, 9, 5])));

        let plus = re("^AS1+$");
        assert!(plus.is_match(&path(&[1, 1, 1])));
        assert!(!plus.is_match(&path(&[])));
    }

    #[test]
    fn test_alternation_and_sets() {
        let alt = re("^(AS1 | AS2) AS3$");
        assert!(alt.is_match(&path(&[1, 3])));
        assert!(alt.is_match(&path(&[2, 3])));
        assert!(!alt.is_match(&path(&[4, 3])));

        let set = re("^[AS1 AS2] AS3$");
        assert!(set.is_match(&path(&[2, 3])));
        assert!(!set.is_match(&path(&[3, 3])));
    }

    #[test]
    fn test_empty_path_and_empty_pattern() {
        let m = re("^$");
        assert!(m.is_match(&path(&[])));
        assert!(!m.is_match(&path(&[1])));
    }

    #[test]
    fn test_match_lengths() {
        let m = re("AS1 AS2");
        assert_eq!(
            m.match_lengths(&path(&[1, 2, 3])),
            BTreeSet::from([2])
        );
        let star = re("AS1 .*");
        assert_eq!(
            star.match_lengths(&path(&[1, 2, 3])),
            BTreeSet::from([1, 2, 3])
        );
    }

    #[test]
    fn test_rejected_syntax() {
        assert!(PathRegex::new("[^AS1]").is_err());
        assert!(PathRegex::new("[AS1-AS5]").is_err());
        assert!(PathRegex::new("AS1~*").is_err());
        assert!(PathRegex::new("AS1 (AS2").is_err());
        assert!(PathRegex::new("[]").is_err());
        assert!(PathRegex::new("bogus").is_err());
    }

    #[test]
    fn test_pattern_round_trips_verbatim() {
        let re = PathRegex::new(" ^AS1 AS2$ ").unwrap();
        assert_eq!(re.as_str(), "^AS1 AS2$");
        assert_eq!(re.to_string(), "^AS1 AS2$");
    }

    #[test]
    fn test_origin_and_first_hop() {
        let p = path(&[64500, 64501, 64502]);
        assert_eq!(p.first_hop(), Some(64500));
        assert_eq!(p.origin(), Some(64502));
        assert_eq!(p.to_string(), "AS64500 AS64501 AS64502");
    }
}
