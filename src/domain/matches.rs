//! Request matching
//!
//! A [`Match`] tests one request attribute and, when it applies, maps the
//! matched value onto an instance metadata constraint.
//!
//! ```text
//! Match { kind: Header, from: ("X-SwVersion", "1.0"), to: ("sunset", "true") }
//! ```
//!
//! matches requests carrying `X-SwVersion: 1.0` and restricts them to
//! instances tagged `sunset=true`. Leaving the values empty maps whatever
//! value the request carries: `from: ("X-GitSha", "")`, `to: ("git-sha", "")`
//! sends the request to instances whose `git-sha` equals the header value.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::comparison::unordered_eq_by;
use crate::domain::metadata::Metadatum;
use crate::validation::{check_index, Validation, ValidationError};

/// Request attribute a match inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Cookie,
    #[default]
    Header,
    Query,
}

/// Returned when parsing an unknown match kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown MatchKind: {0}")]
pub struct UnknownMatchKind(pub String);

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::Header => "header",
            Self::Query => "query",
        }
    }
}

impl FromStr for MatchKind {
    type Err = UnknownMatchKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cookie" => Ok(Self::Cookie),
            "header" => Ok(Self::Header),
            "query" => Ok(Self::Query),
            other => Err(UnknownMatchKind(other.to_string())),
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Match {
    pub kind: MatchKind,

    /// Request attribute name and, optionally, the value it must carry
    #[serde(default)]
    pub from: Metadatum,

    /// Instance metadata constraint added when the match applies
    #[serde(default)]
    pub to: Metadatum,
}

impl Match {
    pub fn new(kind: MatchKind, from: Metadatum, to: Metadatum) -> Self {
        Self { kind, from, to }
    }

    pub fn header(from: Metadatum, to: Metadatum) -> Self {
        Self::new(MatchKind::Header, from, to)
    }

    pub fn cookie(from: Metadatum, to: Metadatum) -> Self {
        Self::new(MatchKind::Cookie, from, to)
    }

    pub fn query(from: Metadatum, to: Metadatum) -> Self {
        Self::new(MatchKind::Query, from, to)
    }

    /// `kind:from-key`; header names are lowercased since they are
    /// case-insensitive on the wire.
    pub fn key(&self) -> String {
        match self.kind {
            MatchKind::Header => format!("{}:{}", self.kind, self.from.key.to_ascii_lowercase()),
            _ => format!("{}:{}", self.kind, self.from.key),
        }
    }

    /// Header names compare case-insensitively, like [`Match::key`];
    /// everything else exactly.
    pub fn equals(&self, other: &Match) -> bool {
        let same_name = match self.kind {
            MatchKind::Header => self.from.key.eq_ignore_ascii_case(&other.from.key),
            _ => self.from.key == other.from.key,
        };
        self.kind == other.kind && same_name && self.from.value == other.from.value && self.to == other.to
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        check_index(&self.from.key, &mut errs, "from.key");

        if !self.to.value.is_empty() && self.to.key.is_empty() {
            errs.add("to.key", "must not be empty if value is set");
        }

        errs.or_nil()
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// The matches of a rule. All must apply for the rule to apply; order is
/// not significant.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Matches(Vec<Match>);

impl<'de> Deserialize<'de> for Matches {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl Matches {
    pub fn new(items: Vec<Match>) -> Self {
        Self(items)
    }

    pub fn push(&mut self, m: Match) {
        self.0.push(m);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.0.iter()
    }

    pub fn equals(&self, other: &Matches) -> bool {
        unordered_eq_by(&self.0, &other.0, Match::equals)
    }

    /// Reports repeated match keys under `matches` and each match's failures
    /// under `matches[kind:key]`.
    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        let mut seen = HashSet::new();

        for m in &self.0 {
            let key = m.key();
            if seen.contains(&key) {
                errs.add("matches", format!("duplicate match found {}", key));
            }
            errs.merge_prefixed(m.is_valid(), &format!("matches[{}]", key));
            seen.insert(key);
        }

        errs.or_nil()
    }
}

impl PartialEq for Matches {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<Vec<Match>> for Matches {
    fn from(items: Vec<Match>) -> Self {
        Self(items)
    }
}

impl FromIterator<Match> for Matches {
    fn from_iter<I: IntoIterator<Item = Match>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Matches {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ErrorCase, ALLOWED_INDEX_PATTERN_MATCH_FAILURE, MUST_NOT_BE_EMPTY};

    fn sw_version() -> Match {
        Match::header(Metadatum::new("X-SwVersion", "1.0"), Metadatum::new("sunset", "true"))
    }

    #[test]
    fn valid_matches() {
        assert!(sw_version().is_valid().is_ok());
        let pass_through = Match::cookie(Metadatum::key_only("git"), Metadatum::key_only("git-sha"));
        assert!(pass_through.is_valid().is_ok());
        let no_mapping = Match::query(Metadatum::key_only("debug"), Metadatum::default());
        assert!(no_mapping.is_valid().is_ok());
    }

    #[test]
    fn from_key_required() {
        let m = Match::header(Metadatum::default(), Metadatum::default());
        let err = m.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("from.key", MUST_NOT_BE_EMPTY)]);

        let m = Match::header(Metadatum::key_only("a[0]"), Metadatum::default());
        let err = m.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("from.key", ALLOWED_INDEX_PATTERN_MATCH_FAILURE)]);
    }

    #[test]
    fn to_value_requires_key() {
        let m = Match::header(Metadatum::key_only("x"), Metadatum::new("", "v"));
        let err = m.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("to.key", "must not be empty if value is set")]);
    }

    #[test]
    fn header_keys_are_case_insensitive() {
        let a = Match::header(Metadatum::key_only("X-Foo"), Metadatum::default());
        let b = Match::cookie(Metadatum::key_only("X-Foo"), Metadatum::default());
        assert_eq!(a.key(), "header:x-foo");
        assert_eq!(b.key(), "cookie:X-Foo");
    }

    #[test]
    fn header_names_compare_case_insensitively() {
        let upper = Match::header(Metadatum::new("X-Foo", "1"), Metadatum::key_only("foo"));
        let lower = Match::header(Metadatum::new("x-foo", "1"), Metadatum::key_only("foo"));
        assert_eq!(upper.key(), lower.key());
        assert!(upper.equals(&lower));
        assert!(Matches::from(vec![upper.clone()]).equals(&Matches::from(vec![lower.clone()])));

        let upper = Match::cookie(Metadatum::new("X-Foo", "1"), Metadatum::key_only("foo"));
        let lower = Match::cookie(Metadatum::new("x-foo", "1"), Metadatum::key_only("foo"));
        assert_ne!(upper.key(), lower.key());
        assert!(!upper.equals(&lower));
        assert!(!Matches::from(vec![upper]).equals(&Matches::from(vec![lower])));

        // the value still compares exactly
        let a = Match::header(Metadatum::new("X-Foo", "A"), Metadatum::default());
        let b = Match::header(Metadatum::new("x-foo", "a"), Metadatum::default());
        assert!(!a.equals(&b));
    }

    #[test]
    fn duplicates_reported() {
        let ms = Matches::from(vec![
            Match::header(Metadatum::key_only("X-Foo"), Metadatum::default()),
            Match::header(Metadatum::key_only("x-foo"), Metadatum::key_only("foo")),
            Match::cookie(Metadatum::key_only("x-foo"), Metadatum::default()),
        ]);
        let err = ms.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("matches", "duplicate match found header:x-foo")]);
    }

    #[test]
    fn item_errors_scoped_by_key() {
        let ms = Matches::from(vec![Match::query(Metadatum::key_only("q"), Metadatum::new("", "v"))]);
        let err = ms.is_valid().unwrap_err();
        assert_eq!(err.errors[0].attribute, "matches[query:q].to.key");
    }

    #[test]
    fn set_equality() {
        let other = Match::cookie(Metadatum::key_only("c"), Metadatum::default());
        let a = Matches::from(vec![sw_version(), other.clone()]);
        let b = Matches::from(vec![other.clone(), sw_version()]);
        assert!(a.equals(&b));
        assert!(!a.equals(&Matches::from(vec![other.clone(), other])));
        let empty: Matches = serde_json::from_str("null").unwrap();
        assert!(empty.equals(&Matches::default()));
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("query".parse::<MatchKind>(), Ok(MatchKind::Query));
        assert_eq!("body".parse::<MatchKind>().unwrap_err().to_string(), "unknown MatchKind: body");
        assert!(serde_json::from_str::<Match>(r#"{"kind":"body","from":{"key":"x"}}"#).is_err());
    }
}
