//! Validation failure aggregation.
//!
//! A [`ValidationError`] collects every field-level failure found while
//! checking an object graph. Children report attributes relative to
//! themselves; parents fold them in with [`ValidationError::merge_prefixed`]
//! so the final report addresses each offending field by a dotted path such
//! as `route.rules[rk0].constraints.light[cc1].weight`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a validation pass. `Ok(())` means no failures were found; an
/// `Err` always carries at least one [`ErrorCase`].
pub type Validation = std::result::Result<(), ValidationError>;

/// A single validation failure: the dotted path of the offending attribute
/// and a description of what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCase {
    pub attribute: String,
    pub msg: String,
}

impl ErrorCase {
    pub fn new(attribute: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { attribute: attribute.into(), msg: msg.into() }
    }

    fn prefixed(&self, under: &str) -> Self {
        Self { attribute: join_path(under, &self.attribute), msg: self.msg.clone() }
    }
}

impl fmt::Display for ErrorCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.msg)
    }
}

/// Ordered collection of [`ErrorCase`]s found while validating an object.
///
/// Serializes as `{"errors": [{"attribute": "...", "msg": "..."}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{}", self.message())]
pub struct ValidationError {
    pub errors: Vec<ErrorCase>,
}

impl ValidationError {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a report holding exactly one failure.
    pub fn single(attribute: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { errors: vec![ErrorCase::new(attribute, msg)] }
    }

    /// Append a failure.
    pub fn add_new(&mut self, case: ErrorCase) {
        self.errors.push(case);
    }

    /// Append a failure built from its parts.
    pub fn add(&mut self, attribute: impl Into<String>, msg: impl Into<String>) {
        self.add_new(ErrorCase::new(attribute, msg));
    }

    /// Append every failure from `other`. A passing result is a no-op.
    pub fn merge(&mut self, other: Validation) {
        if let Err(other) = other {
            self.errors.extend(other.errors);
        }
    }

    /// Append every failure from `children` with `under` prepended to each
    /// attribute. The separator is only inserted when both the prefix and the
    /// attribute are non-empty.
    pub fn merge_prefixed(&mut self, children: Validation, under: &str) {
        if let Err(children) = children {
            self.errors.extend(children.errors.iter().map(|e| e.prefixed(under)));
        }
    }

    /// Consume the report, prepending `under` to every attribute.
    pub fn prefixed(self, under: &str) -> Self {
        Self { errors: self.errors.iter().map(|e| e.prefixed(under)).collect() }
    }

    /// Collapse an empty aggregator into the passing result.
    pub fn or_nil(self) -> Validation {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the collected failures in the order they were found.
    pub fn iter(&self) -> std::slice::Iter<'_, ErrorCase> {
        self.errors.iter()
    }

    /// Sort failures by attribute path, keeping the relative order of cases
    /// that share an attribute.
    pub fn sort_by_attribute(&mut self) {
        self.errors.sort_by(|a, b| a.attribute.cmp(&b.attribute));
    }

    /// True if any failure was reported against exactly `attribute`.
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.errors.iter().any(|e| e.attribute == attribute)
    }

    /// Human readable summary: `N validation error(s); path: msg; ...`.
    pub fn message(&self) -> String {
        let plural = if self.errors.len() == 1 { "" } else { "s" };
        let mut msg = format!("{} validation error{}", self.errors.len(), plural);
        for case in &self.errors {
            msg.push_str("; ");
            msg.push_str(&case.to_string());
        }
        msg
    }
}

impl From<ErrorCase> for ValidationError {
    fn from(case: ErrorCase) -> Self {
        Self { errors: vec![case] }
    }
}

impl<'a> IntoIterator for &'a ValidationError {
    type Item = &'a ErrorCase;
    type IntoIter = std::slice::Iter<'a, ErrorCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Join two attribute path segments with `.`, skipping the separator when
/// either side is empty.
pub fn join_path(prefix: &str, attribute: &str) -> String {
    match (prefix.is_empty(), attribute.is_empty()) {
        (true, _) => attribute.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}.{}", prefix, attribute),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child() -> Validation {
        let mut errs = ValidationError::new();
        errs.add("x", "bad x");
        errs.add("", "bad self");
        errs.or_nil()
    }

    #[test]
    fn empty_aggregator_collapses_to_ok() {
        assert_eq!(ValidationError::new().or_nil(), Ok(()));
    }

    #[test]
    fn non_empty_aggregator_is_err() {
        let mut errs = ValidationError::new();
        errs.add_new(ErrorCase::new("name", "must not be empty"));
        let err = errs.or_nil().unwrap_err();
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut errs = ValidationError::single("a", "first");
        errs.merge(child());
        errs.merge(Ok(()));

        let attrs: Vec<_> = errs.iter().map(|e| e.attribute.as_str()).collect();
        assert_eq!(attrs, vec!["a", "x", ""]);
    }

    #[test]
    fn merge_prefixed_joins_paths() {
        let mut errs = ValidationError::new();
        errs.merge_prefixed(child(), "parent");

        assert_eq!(
            errs.errors,
            vec![ErrorCase::new("parent.x", "bad x"), ErrorCase::new("parent", "bad self")]
        );
    }

    #[test]
    fn merge_prefixed_with_empty_prefix_keeps_attribute() {
        let mut errs = ValidationError::new();
        errs.merge_prefixed(child(), "");

        assert_eq!(errs.errors, vec![ErrorCase::new("x", "bad x"), ErrorCase::new("", "bad self")]);
    }

    #[test]
    fn merge_prefixed_leaves_source_untouched() {
        let source = child();
        let copy = source.clone();
        let mut errs = ValidationError::new();
        errs.merge_prefixed(copy, "parent");

        assert_eq!(source.unwrap_err().errors[0].attribute, "x");
    }

    #[test]
    fn prefixed_scopes_every_case() {
        let err = child().map_err(|e| e.prefixed("route")).unwrap_err();
        assert_eq!(
            err.errors,
            vec![ErrorCase::new("route.x", "bad x"), ErrorCase::new("route", "bad self")]
        );
    }

    #[test]
    fn message_format() {
        let single = ValidationError::single("org.name", "must not be empty");
        assert_eq!(single.to_string(), "1 validation error; org.name: must not be empty");

        let mut many = ValidationError::single("a", "one");
        many.add("b", "two");
        assert_eq!(many.to_string(), "2 validation errors; a: one; b: two");
    }

    #[test]
    fn serializes_as_error_envelope() {
        let err = ValidationError::single("route.path", "must not be empty");
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"errors": [{"attribute": "route.path", "msg": "must not be empty"}]})
        );
    }

    #[test]
    fn sort_by_attribute_orders_paths() {
        let mut errs = ValidationError::single("z", "1");
        errs.add("a", "2");
        errs.sort_by_attribute();
        assert_eq!(errs.errors[0].attribute, "a");
    }
}
