//! Data attached to responses
//!
//! Routes, shared rules and cluster constraints can export headers and
//! cookies onto the responses they serve. Header names are case-insensitive;
//! cookie names are not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::comparison::unordered_eq_by;
use crate::validation::{
    check_pattern, Validation, ValidationError, COOKIE_NAME_PATTERN, HEADER_NAME_PATTERN,
};

/// `Expires` attribute format for cookies.
const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// What to send back and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResponseDatum {
    /// Name of the header or cookie
    #[serde(default)]
    pub name: String,

    /// A literal value, or the key of a metadatum on the instance that served
    /// the request
    #[serde(default)]
    pub value: String,

    /// Treat `value` as a literal rather than a metadata reference
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub value_is_literal: bool,

    /// Send on every response rather than only on 2xx and 3xx
    #[serde(default)]
    pub always_send: bool,
}

impl ResponseDatum {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), ..Default::default() }
    }
}

/// A header attached to responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderDatum {
    #[serde(flatten)]
    pub datum: ResponseDatum,
}

impl HeaderDatum {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { datum: ResponseDatum::new(name, value) }
    }

    pub fn name(&self) -> &str {
        &self.datum.name
    }

    /// ASCII-lowercased name used for de-duplication; agrees with [`HeaderDatum::equals`].
    pub fn canonical_name(&self) -> String {
        self.datum.name.to_ascii_lowercase()
    }

    /// Names compare case-insensitively; every other field exactly.
    pub fn equals(&self, other: &HeaderDatum) -> bool {
        self.datum.name.eq_ignore_ascii_case(&other.datum.name)
            && self.datum.value == other.datum.value
            && self.datum.value_is_literal == other.datum.value_is_literal
            && self.datum.always_send == other.datum.always_send
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        check_pattern(false, &self.datum.name, &mut errs, &HEADER_NAME_PATTERN, "name");
        if self.datum.value.trim().is_empty() {
            errs.add("value", "may not be empty");
        }
        errs.or_nil()
    }
}

impl PartialEq for HeaderDatum {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SameSite {
    #[default]
    #[serde(rename = "")]
    Unset,
    Strict,
    Lax,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Strict => f.write_str("Strict"),
            Self::Lax => f.write_str("Lax"),
        }
    }
}

/// A cookie attached to responses via `Set-Cookie`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieDatum {
    #[serde(flatten)]
    pub datum: ResponseDatum,

    /// Lifetime in seconds; zero expires the cookie immediately
    #[serde(default)]
    pub expires_in_sec: Option<u32>,

    #[serde(default)]
    pub domain: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub secure: bool,

    #[serde(default)]
    pub http_only: bool,

    #[serde(default)]
    pub same_site: SameSite,
}

impl CookieDatum {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { datum: ResponseDatum::new(name, value), ..Default::default() }
    }

    pub fn name(&self) -> &str {
        &self.datum.name
    }

    /// Exact equality; names are case-sensitive.
    pub fn equals(&self, other: &CookieDatum) -> bool {
        self == other
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        check_pattern(false, &self.datum.name, &mut errs, &COOKIE_NAME_PATTERN, "name");
        errs.or_nil()
    }

    /// Attribute string appended to the cookie, e.g.
    /// `Max-Age=60; Path=/; Secure; SameSite=Lax`.
    pub fn annotation(&self) -> String {
        let mut parts = Vec::new();

        match self.expires_in_sec {
            Some(0) => parts.push(format!(
                "Expires={}",
                DateTime::<Utc>::UNIX_EPOCH.format(COOKIE_DATE_FORMAT)
            )),
            Some(secs) => parts.push(format!("Max-Age={}", secs)),
            None => {}
        }

        if !self.domain.is_empty() {
            parts.push(format!("Domain={}", self.domain));
        }
        if !self.path.is_empty() {
            parts.push(format!("Path={}", self.path));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if self.same_site != SameSite::Unset {
            parts.push(format!("SameSite={}", self.same_site));
        }

        parts.join("; ")
    }
}

/// Headers and cookies to attach to responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::utils::null_as_default"
    )]
    pub headers: Vec<HeaderDatum>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::utils::null_as_default"
    )]
    pub cookies: Vec<CookieDatum>,
}

impl ResponseData {
    pub fn with_header(mut self, header: HeaderDatum) -> Self {
        self.headers.push(header);
        self
    }

    pub fn with_cookie(mut self, cookie: CookieDatum) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Number of headers plus cookies.
    pub fn len(&self) -> usize {
        self.headers.len() + self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same headers and cookies in any order.
    pub fn equals(&self, other: &ResponseData) -> bool {
        unordered_eq_by(&self.headers, &other.headers, HeaderDatum::equals)
            && unordered_eq_by(&self.cookies, &other.cookies, CookieDatum::equals)
    }

    /// Reports a header exported twice (names compared case-insensitively)
    /// under `headers`, a cookie exported twice under `cookies`, and each
    /// datum's failures under `headers[name]` or `cookies[name]`.
    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        let mut seen_headers = HashSet::new();
        for hdr in &self.headers {
            if !seen_headers.insert(hdr.canonical_name()) {
                errs.add("headers", format!("Header {:?} exported multiple times", hdr.name()));
            }
            errs.merge_prefixed(hdr.is_valid(), &format!("headers[{}]", hdr.name()));
        }

        let mut seen_cookies = HashSet::new();
        for ck in &self.cookies {
            if !seen_cookies.insert(ck.name()) {
                errs.add("cookies", format!("Cookie {:?} exported multiple times", ck.name()));
            }
            errs.merge_prefixed(ck.is_valid(), &format!("cookies[{}]", ck.name()));
        }

        errs.or_nil()
    }
}

impl PartialEq for ResponseData {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}
