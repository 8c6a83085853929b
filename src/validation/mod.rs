//! # Validation
//!
//! Shared building blocks for validating the configuration graph:
//!
//! 1. [`ValidationError`] / [`ErrorCase`], the aggregated failure report
//! 2. Static patterns for keys, index values, host names, header and cookie
//!    names and domain aliases
//! 3. Check helpers that append failures to a caller-owned aggregator
//!
//! Validation never stops at the first failure. Every helper appends to the
//! aggregator it is handed and returns nothing, so callers check every field
//! and merge every child result before collapsing with
//! [`ValidationError::or_nil`].

use lazy_static::lazy_static;
use regex::Regex;

pub mod report;

pub use report::{join_path, ErrorCase, Validation, ValidationError};

/// Pattern every entity key must match.
pub const KEY_PATTERN_STR: &str = r"^[0-9a-zA-Z_]+(-[0-9a-zA-Z_]+)*$";

/// Pattern for values used as an index component of an attribute path.
pub const ALLOWED_INDEX_PATTERN_STR: &str = r"^[^\[\]]+$";

/// Pattern an instance host must match.
pub const HOST_PATTERN_STR: &str = r"^[a-zA-Z0-9_.-]+$";

/// HTTP header field names (RFC 7230 token).
pub const HEADER_NAME_PATTERN_STR: &str = r"^[0-9A-Za-z!#$%&'*+.^_`|~-]+$";

/// Cookie names (RFC 6265 token).
pub const COOKIE_NAME_PATTERN_STR: &str = r"^[0-9A-Za-z!#$%&'*+.^_`|~-]+$";

/// Redirect names and redirect header constraint names.
pub const REDIRECT_NAME_PATTERN_STR: &str = r"^[0-9A-Za-z-]+$";

/// Domain aliases: an exact name, a `*.`-prefixed name, or a `.*`-suffixed
/// name.
pub const DOMAIN_ALIAS_PATTERN_STR: &str =
    r"^(\*\.)?[0-9A-Za-z_-]+(\.[0-9A-Za-z_-]+)*(\.\*)?$";

pub const KEY_PATTERN_MATCH_FAILURE: &str =
    "must match pattern: ^[0-9a-zA-Z_]+(-[0-9a-zA-Z_]+)*$";
pub const ALLOWED_INDEX_PATTERN_MATCH_FAILURE: &str = "may not contain [ or ] characters";
pub const HOST_PATTERN_MATCH_FAILURE: &str = "host must match ^[a-zA-Z0-9_.-]+$";

pub const MUST_NOT_BE_EMPTY: &str = "must not be empty";

lazy_static! {
    pub static ref KEY_PATTERN: Regex = Regex::new(KEY_PATTERN_STR).unwrap();
    pub static ref ALLOWED_INDEX_PATTERN: Regex = Regex::new(ALLOWED_INDEX_PATTERN_STR).unwrap();
    pub static ref HOST_PATTERN: Regex = Regex::new(HOST_PATTERN_STR).unwrap();
    pub static ref HEADER_NAME_PATTERN: Regex = Regex::new(HEADER_NAME_PATTERN_STR).unwrap();
    pub static ref COOKIE_NAME_PATTERN: Regex = Regex::new(COOKIE_NAME_PATTERN_STR).unwrap();
    pub static ref REDIRECT_NAME_PATTERN: Regex = Regex::new(REDIRECT_NAME_PATTERN_STR).unwrap();
    pub static ref DOMAIN_ALIAS_PATTERN: Regex = Regex::new(DOMAIN_ALIAS_PATTERN_STR).unwrap();
}

/// Require `key` to be non-blank and to match [`KEY_PATTERN`].
pub fn check_key(key: &str, errs: &mut ValidationError, named: &str) {
    if key.trim().is_empty() {
        errs.add(named, MUST_NOT_BE_EMPTY);
    } else if !KEY_PATTERN.is_match(key) {
        errs.add(named, KEY_PATTERN_MATCH_FAILURE);
    }
}

/// Like [`check_key`], but an empty key is accepted before creation since the
/// server assigns it.
pub fn check_entity_key(key: &str, precreation: bool, errs: &mut ValidationError, named: &str) {
    if precreation && key.is_empty() {
        return;
    }
    check_key(key, errs, named);
}

/// Require `value` to be non-blank and usable as a path index.
pub fn check_index(value: &str, errs: &mut ValidationError, named: &str) {
    if value.trim().is_empty() {
        errs.add(named, MUST_NOT_BE_EMPTY);
    } else if !ALLOWED_INDEX_PATTERN.is_match(value) {
        errs.add(named, ALLOWED_INDEX_PATTERN_MATCH_FAILURE);
    }
}

/// Require `value` to match `pattern`. Blank values fail unless
/// `allow_empty` is set.
pub fn check_pattern(
    allow_empty: bool,
    value: &str,
    errs: &mut ValidationError,
    pattern: &Regex,
    named: &str,
) {
    if value.trim().is_empty() {
        if !allow_empty {
            errs.add(named, MUST_NOT_BE_EMPTY);
        }
        return;
    }

    if !pattern.is_match(value) {
        errs.add(named, format!("must match {}", pattern.as_str()));
    }
}

/// Require a plain string field to be non-empty.
pub fn check_not_empty(value: &str, errs: &mut ValidationError, named: &str) {
    if value.is_empty() {
        errs.add(named, MUST_NOT_BE_EMPTY);
    }
}

/// Report a negative optional value.
pub fn check_non_negative(value: Option<i32>, errs: &mut ValidationError, named: &str) {
    if matches!(value, Some(v) if v < 0) {
        errs.add(named, "must not be negative");
    }
}

/// Report an optional percentage outside `[0, 100]`.
pub fn check_percentage(value: Option<i32>, errs: &mut ValidationError, named: &str) {
    match value {
        Some(v) if v < 0 => errs.add(named, "must not be negative"),
        Some(v) if v > 100 => errs.add(named, "must be less than or equal to 100"),
        _ => {}
    }
}

/// Report an optional value that is set but not strictly positive.
pub fn check_positive(value: Option<i32>, errs: &mut ValidationError, named: &str) {
    if matches!(value, Some(v) if v < 1) {
        errs.add(named, "must be greater than zero");
    }
}
