//! URL rewrites applied by a domain before routing
//!
//! Redirects are tried in order, so [`Redirects`] compare position by
//! position. A redirect may be restricted to requests carrying a header that
//! matches a [`HeaderConstraint`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::comparison::ordered_eq_by;
use crate::validation::{check_pattern, Validation, ValidationError, REDIRECT_NAME_PATTERN};

/// How the proxy answers a redirected request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectType {
    /// 301 with the rewritten URL
    #[default]
    Permanent,
    /// 302 with the rewritten URL
    Temporary,
}

impl fmt::Display for RedirectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Temporary => write!(f, "temporary"),
        }
    }
}

/// A requirement on a request header for a redirect to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeaderConstraint {
    /// Header name, compared case-insensitively
    #[serde(default)]
    pub name: String,

    /// Regular expression the header value must match
    #[serde(default)]
    pub value: String,

    /// Compare the value case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,

    /// Apply the redirect when the value does NOT match
    #[serde(default)]
    pub invert: bool,
}

impl HeaderConstraint {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), ..Default::default() }
    }

    pub fn equals(&self, other: &HeaderConstraint) -> bool {
        self == other
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        check_pattern(false, &self.name, &mut errs, &REDIRECT_NAME_PATTERN, "name");

        if let Err(e) = Regex::new(&self.value) {
            errs.add("value", format!("must be a valid regexp: {}", e));
        }

        errs.or_nil()
    }
}

/// Header constraints of a redirect. At most one is currently supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderConstraints(Vec<HeaderConstraint>);

impl<'de> Deserialize<'de> for HeaderConstraints {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl HeaderConstraints {
    pub fn new(items: Vec<HeaderConstraint>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderConstraint> {
        self.0.iter()
    }

    pub fn equals(&self, other: &HeaderConstraints) -> bool {
        self == other
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        if self.0.len() > 1 {
            errs.add("header_constraints", "may only specify 0 or 1 header constraints");
        }

        let mut seen = HashSet::new();
        for hc in &self.0 {
            let scope = format!("header_constraints[{}]", hc.name);
            if !seen.insert(hc.name.to_ascii_lowercase()) {
                errs.add(scope, "a header may only have a single constraint");
                continue;
            }
            errs.merge_prefixed(hc.is_valid(), &scope);
        }

        errs.or_nil()
    }
}

impl From<Vec<HeaderConstraint>> for HeaderConstraints {
    fn from(items: Vec<HeaderConstraint>) -> Self {
        Self(items)
    }
}

/// Rewrites URLs matching `from` to `to`. `from` may contain capture groups
/// referenced from `to` as `$1`, `$2` and so on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Redirect {
    #[serde(default)]
    pub name: String,

    /// Regular expression matched against the request URL
    #[serde(default)]
    pub from: String,

    /// Replacement URL
    #[serde(default)]
    pub to: String,

    #[serde(default)]
    pub redirect_type: RedirectType,

    #[serde(default)]
    pub header_constraints: HeaderConstraints,
}

impl Redirect {
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        redirect_type: RedirectType,
    ) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to: to.into(),
            redirect_type,
            header_constraints: HeaderConstraints::default(),
        }
    }

    /// Restrict the redirect to requests matching `constraint`.
    pub fn with_header_constraint(mut self, constraint: HeaderConstraint) -> Self {
        self.header_constraints.0.push(constraint);
        self
    }

    pub fn equals(&self, other: &Redirect) -> bool {
        self.name == other.name
            && self.from == other.from
            && self.to == other.to
            && self.redirect_type == other.redirect_type
            && self.header_constraints.equals(&other.header_constraints)
    }

    /// Checks the name, that `from` compiles, that `to` is set and the
    /// header constraints. `to` is not checked against the capture groups.
    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        check_pattern(false, &self.name, &mut errs, &REDIRECT_NAME_PATTERN, "name");

        if self.from.is_empty() {
            errs.add("from", "must not be empty");
        } else if let Err(e) = Regex::new(&self.from) {
            errs.add("from", format!("invalid url match expression '{}'", e));
        }

        if self.to.is_empty() {
            errs.add("to", "must not be empty");
        }

        errs.merge(self.header_constraints.is_valid());

        errs.or_nil()
    }
}

impl PartialEq for Redirect {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// The redirects of a domain, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Redirects(Vec<Redirect>);

impl<'de> Deserialize<'de> for Redirects {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl Redirects {
    pub fn new(items: Vec<Redirect>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Redirect> {
        self.0.iter()
    }

    pub fn push(&mut self, redirect: Redirect) {
        self.0.push(redirect);
    }

    /// Redirects indexed by name.
    pub fn as_map(&self) -> HashMap<&str, &Redirect> {
        self.0.iter().map(|r| (r.name.as_str(), r)).collect()
    }

    /// Names in list order.
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|r| r.name.as_str()).collect()
    }

    /// Positional: the same redirects in the same order.
    pub fn equals(&self, other: &Redirects) -> bool {
        ordered_eq_by(&self.0, &other.0, Redirect::equals)
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        let mut seen = HashSet::new();

        for r in &self.0 {
            if !seen.insert(r.name.as_str()) {
                errs.add(
                    "redirects",
                    format!("name must be unique, multiple redirects found called '{}'", r.name),
                );
            }
            errs.merge_prefixed(r.is_valid(), &format!("redirects[{}]", r.name));
        }

        errs.or_nil()
    }
}

impl From<Vec<Redirect>> for Redirects {
    fn from(items: Vec<Redirect>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a Redirects {
    type Item = &'a Redirect;
    type IntoIter = std::slice::Iter<'a, Redirect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ErrorCase, REDIRECT_NAME_PATTERN_STR};

    fn force_https() -> Redirect {
        Redirect::new("force-https", "(.*)", "https://$host$1", RedirectType::Permanent)
            .with_header_constraint(HeaderConstraint {
                name: "X-Forwarded-Proto".to_string(),
                value: "https".to_string(),
                invert: true,
                ..Default::default()
            })
    }

    #[test]
    fn valid_redirect() {
        assert!(force_https().is_valid().is_ok());
    }

    #[test]
    fn reports_every_field() {
        let r = Redirect::new("bad name", "(", "", RedirectType::Temporary);
        let err = r.is_valid().unwrap_err();
        let attrs: Vec<_> = err.iter().map(|e| e.attribute.as_str()).collect();
        assert_eq!(attrs, vec!["name", "from", "to"]);
        assert_eq!(err.errors[0].msg, format!("must match {}", REDIRECT_NAME_PATTERN_STR));
        assert!(err.errors[1].msg.starts_with("invalid url match expression"));
    }

    #[test]
    fn type_round_trips_as_lowercase() {
        let r: Redirect = serde_json::from_str(
            r#"{"name":"a","from":".*","to":"b","redirect_type":"temporary"}"#,
        )
        .unwrap();
        assert_eq!(r.redirect_type, RedirectType::Temporary);
        assert!(serde_json::from_str::<Redirect>(r#"{"redirect_type":"sideways"}"#).is_err());
    }

    #[test]
    fn header_constraints_limited_and_unique() {
        let list = HeaderConstraints::from(vec![
            HeaderConstraint::new("X-A", "a"),
            HeaderConstraint::new("x-a", "("),
        ]);
        let err = list.is_valid().unwrap_err();
        assert_eq!(
            err.errors,
            vec![
                ErrorCase::new("header_constraints", "may only specify 0 or 1 header constraints"),
                ErrorCase::new("header_constraints[x-a]", "a header may only have a single constraint"),
            ]
        );
    }

    #[test]
    fn header_constraint_names_fold_ascii_only() {
        let list = HeaderConstraints::from(vec![HeaderConstraint::new("X-Ä", "a"), HeaderConstraint::new("x-ä", "b")]);
        let err = list.is_valid().unwrap_err();
        assert!(err.has_attribute("header_constraints"), "{}", err);
        assert!(!err.iter().any(|c| c.msg == "a header may only have a single constraint"), "{}", err);
    }

    #[test]
    fn header_constraint_value_must_compile() {
        let err = HeaderConstraint::new("X-A", "[").is_valid().unwrap_err();
        assert_eq!(err.errors[0].attribute, "value");
    }

    #[test]
    fn list_is_ordered() {
        let a = Redirect::new("a", ".*", "x", RedirectType::Permanent);
        let b = Redirect::new("b", ".*", "y", RedirectType::Permanent);
        let ab = Redirects::from(vec![a.clone(), b.clone()]);
        let ba = Redirects::from(vec![b, a]);
        assert!(!ab.equals(&ba));
        assert!(ab.equals(&ab.clone()));
        assert_eq!(ab.keys(), vec!["a", "b"]);
        assert!(ab.as_map().contains_key("b"));
    }

    #[test]
    fn duplicate_names() {
        let a = Redirect::new("a", ".*", "x", RedirectType::Permanent);
        let list = Redirects::from(vec![a.clone(), a]);
        let err = list.is_valid().unwrap_err();
        assert_eq!(
            err.errors,
            vec![ErrorCase::new("redirects", "name must be unique, multiple redirects found called 'a'")]
        );
    }

    #[test]
    fn nested_errors_are_scoped_by_name() {
        let list = Redirects::from(vec![Redirect::new("a", ".*", "", RedirectType::Permanent)]);
        let err = list.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("redirects[a].to", "must not be empty")]);
    }
}
