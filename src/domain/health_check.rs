//! Active health checking configuration
//!
//! A cluster carries at most one [`HealthCheck`]. Each check runs exactly one
//! kind of probe, modelled as the [`HealthChecker`] sum type so a check with
//! both or neither probe cannot be built. The wire form keeps the original
//! pair of optional objects; [`HealthChecker::from_parts`] converts it.
//!
//! Health checks have a total order (see [`HealthCheck::compare`]) so that
//! lists of them compare independently of position.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::comparison::{compare_optional, compare_string_slices};
use crate::domain::metadata::{metadata_valid, Metadata, Metadatum};
use crate::validation::{
    check_positive, Validation, ValidationError, HEADER_NAME_PATTERN, MUST_NOT_BE_EMPTY,
};

const MUST_BE_POSITIVE: &str = "must be greater than zero";

/// HTTP probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHealthCheck {
    /// Host header for the probe; empty means the cluster name
    #[serde(default)]
    pub host: String,

    /// Path requested by the probe
    #[serde(default)]
    pub path: String,

    /// Expected upstream service name, compared against the health-checked
    /// cluster header when set
    #[serde(default)]
    pub service_name: String,

    /// Headers added to every probe request
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub request_headers_to_add: Metadata,
}

impl HttpHealthCheck {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    pub fn compare(&self, other: &HttpHealthCheck) -> Ordering {
        self.host
            .cmp(&other.host)
            .then_with(|| self.path.cmp(&other.path))
            .then_with(|| self.service_name.cmp(&other.service_name))
            .then_with(|| self.request_headers_to_add.compare(&other.request_headers_to_add))
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        if self.path.is_empty() {
            errs.add("path", MUST_NOT_BE_EMPTY);
        }

        let header_name = |datum: &Metadatum| -> Validation {
            if HEADER_NAME_PATTERN.is_match(&datum.key) {
                Ok(())
            } else {
                Err(ValidationError::single(
                    "key",
                    format!("must match {}", HEADER_NAME_PATTERN.as_str()),
                ))
            }
        };
        errs.merge(metadata_valid("request_headers_to_add", &self.request_headers_to_add, &[
            &header_name,
        ]));

        errs.or_nil()
    }
}

/// TCP probe. Payloads are base64 encoded byte blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpHealthCheck {
    /// Bytes sent by the probe; empty means connect-only
    #[serde(default)]
    pub send: String,

    /// Blocks expected in the response, in order but not necessarily
    /// contiguous
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::utils::null_as_default"
    )]
    pub receive: Vec<String>,
}

impl TcpHealthCheck {
    pub fn compare(&self, other: &TcpHealthCheck) -> Ordering {
        self.send.cmp(&other.send).then_with(|| compare_string_slices(&self.receive, &other.receive))
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        let engine = base64::engine::general_purpose::STANDARD;

        if !self.send.is_empty() && engine.decode(&self.send).is_err() {
            errs.add("send", "must be base64 encoded");
        }

        for (idx, block) in self.receive.iter().enumerate() {
            if engine.decode(block).is_err() {
                errs.add(format!("receive[{}]", idx), "must be base64 encoded");
            }
        }

        errs.or_nil()
    }
}

/// The probe a health check runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HealthCheckerParts", into = "HealthCheckerParts")]
pub enum HealthChecker {
    Http(HttpHealthCheck),
    Tcp(TcpHealthCheck),
}

/// Wire form of [`HealthChecker`]: two optional probes of which exactly one
/// must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthCheckerParts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_health_check: Option<HttpHealthCheck>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_health_check: Option<TcpHealthCheck>,
}

impl HealthChecker {
    /// Build a checker from the optional pair, rejecting none or both.
    pub fn from_parts(
        http: Option<HttpHealthCheck>,
        tcp: Option<TcpHealthCheck>,
    ) -> Result<Self, ValidationError> {
        match (http, tcp) {
            (Some(http), None) => Ok(Self::Http(http)),
            (None, Some(tcp)) => Ok(Self::Tcp(tcp)),
            (None, None) => {
                Err(ValidationError::single("health_checker", "must have one health check defined"))
            }
            (Some(_), Some(_)) => Err(ValidationError::single(
                "health_checker",
                "must not have more than one type of health check defined",
            )),
        }
    }

    pub fn http(&self) -> Option<&HttpHealthCheck> {
        match self {
            Self::Http(http) => Some(http),
            Self::Tcp(_) => None,
        }
    }

    pub fn tcp(&self) -> Option<&TcpHealthCheck> {
        match self {
            Self::Tcp(tcp) => Some(tcp),
            Self::Http(_) => None,
        }
    }

    pub fn equals(&self, other: &HealthChecker) -> bool {
        self.compare(other) == Ordering::Equal
    }

    /// TCP probes sort before HTTP probes; probes of the same kind compare
    /// field by field.
    pub fn compare(&self, other: &HealthChecker) -> Ordering {
        match (self, other) {
            (Self::Http(a), Self::Http(b)) => a.compare(b),
            (Self::Tcp(a), Self::Tcp(b)) => a.compare(b),
            (Self::Tcp(_), Self::Http(_)) => Ordering::Less,
            (Self::Http(_), Self::Tcp(_)) => Ordering::Greater,
        }
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        match self {
            Self::Http(http) => errs.merge_prefixed(http.is_valid(), "http_health_check"),
            Self::Tcp(tcp) => errs.merge_prefixed(tcp.is_valid(), "tcp_health_check"),
        }
        errs.or_nil()
    }
}

impl TryFrom<HealthCheckerParts> for HealthChecker {
    type Error = ValidationError;

    fn try_from(parts: HealthCheckerParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts.http_health_check, parts.tcp_health_check)
    }
}

impl From<HealthChecker> for HealthCheckerParts {
    fn from(checker: HealthChecker) -> Self {
        match checker {
            HealthChecker::Http(http) => Self { http_health_check: Some(http), ..Default::default() },
            HealthChecker::Tcp(tcp) => Self { tcp_health_check: Some(tcp), ..Default::default() },
        }
    }
}

/// Active health check parameters for the instances of a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Time to wait for a probe response
    pub timeout_msec: i32,

    /// Time between probes
    pub interval_msec: i32,

    /// Jitter added to each interval (proxy default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_jitter_msec: Option<i32>,

    /// Failed probes before an instance is marked unhealthy
    pub unhealthy_threshold: i32,

    /// Successful probes before an instance is marked healthy
    pub healthy_threshold: i32,

    /// Reuse the probe connection between checks (proxy default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse_connection: Option<bool>,

    /// Interval used while the cluster has never seen traffic (proxy default 60s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_traffic_interval_msec: Option<i32>,

    /// Interval used for instances marked unhealthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy_interval_msec: Option<i32>,

    /// Interval for the first probe after an instance turns unhealthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy_edge_interval_msec: Option<i32>,

    /// Interval for the first probe after an instance turns healthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy_edge_interval_msec: Option<i32>,

    pub health_checker: HealthChecker,
}

impl HealthCheck {
    /// A check with the required fields set and every optional field unset.
    pub fn new(
        timeout_msec: i32,
        interval_msec: i32,
        unhealthy_threshold: i32,
        healthy_threshold: i32,
        health_checker: HealthChecker,
    ) -> Self {
        Self {
            timeout_msec,
            interval_msec,
            interval_jitter_msec: None,
            unhealthy_threshold,
            healthy_threshold,
            reuse_connection: None,
            no_traffic_interval_msec: None,
            unhealthy_interval_msec: None,
            unhealthy_edge_interval_msec: None,
            healthy_edge_interval_msec: None,
            health_checker,
        }
    }

    pub fn equals(&self, other: &HealthCheck) -> bool {
        self.compare(other) == Ordering::Equal
    }

    /// Lexicographic over timeout, interval, jitter, the no-traffic,
    /// unhealthy, unhealthy-edge and healthy-edge intervals, the two
    /// thresholds, connection reuse and finally the checker. Unset optional
    /// values sort before set ones.
    pub fn compare(&self, other: &HealthCheck) -> Ordering {
        self.timeout_msec
            .cmp(&other.timeout_msec)
            .then_with(|| self.interval_msec.cmp(&other.interval_msec))
            .then_with(|| compare_optional(&self.interval_jitter_msec, &other.interval_jitter_msec))
            .then_with(|| {
                compare_optional(&self.no_traffic_interval_msec, &other.no_traffic_interval_msec)
            })
            .then_with(|| {
                compare_optional(&self.unhealthy_interval_msec, &other.unhealthy_interval_msec)
            })
            .then_with(|| {
                compare_optional(
                    &self.unhealthy_edge_interval_msec,
                    &other.unhealthy_edge_interval_msec,
                )
            })
            .then_with(|| {
                compare_optional(&self.healthy_edge_interval_msec, &other.healthy_edge_interval_msec)
            })
            .then_with(|| self.unhealthy_threshold.cmp(&other.unhealthy_threshold))
            .then_with(|| self.healthy_threshold.cmp(&other.healthy_threshold))
            .then_with(|| compare_optional(&self.reuse_connection, &other.reuse_connection))
            .then_with(|| self.health_checker.compare(&other.health_checker))
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        if self.timeout_msec < 1 {
            errs.add("timeout_msec", MUST_BE_POSITIVE);
        }
        if self.interval_msec < 1 {
            errs.add("interval_msec", MUST_BE_POSITIVE);
        }
        check_positive(self.interval_jitter_msec, &mut errs, "interval_jitter_msec");
        if self.unhealthy_threshold < 1 {
            errs.add("unhealthy_threshold", MUST_BE_POSITIVE);
        }
        if self.healthy_threshold < 1 {
            errs.add("healthy_threshold", MUST_BE_POSITIVE);
        }
        check_positive(self.no_traffic_interval_msec, &mut errs, "no_traffic_interval_msec");
        check_positive(self.unhealthy_interval_msec, &mut errs, "unhealthy_interval_msec");
        check_positive(
            self.unhealthy_edge_interval_msec,
            &mut errs,
            "unhealthy_edge_interval_msec",
        );
        check_positive(self.healthy_edge_interval_msec, &mut errs, "healthy_edge_interval_msec");

        errs.merge_prefixed(self.health_checker.is_valid(), "health_checker");

        errs.or_nil()
    }
}

impl PartialEq for HealthCheck {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for HealthCheck {}

impl PartialOrd for HealthCheck {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HealthCheck {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

/// Health checks of a cluster. Only a single check is currently supported.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct HealthChecks(Vec<HealthCheck>);

impl<'de> Deserialize<'de> for HealthChecks {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl HealthChecks {
    pub fn new(items: Vec<HealthCheck>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HealthCheck> {
        self.0.iter()
    }

    /// A copy sorted by [`HealthCheck::compare`].
    pub fn sorted(&self) -> Vec<HealthCheck> {
        let mut items = self.0.clone();
        items.sort();
        items
    }

    /// Equal by content regardless of position; neither list is reordered.
    pub fn equals(&self, other: &HealthChecks) -> bool {
        self.len() == other.len()
            && self.sorted().iter().zip(other.sorted().iter()).all(|(a, b)| a.equals(b))
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        if self.0.len() > 1 {
            errs.add("health_checks", "only a single health check supported");
        }

        for (idx, hc) in self.0.iter().enumerate() {
            errs.merge_prefixed(hc.is_valid(), &format!("health_checks[{}]", idx));
        }

        errs.or_nil()
    }
}

impl PartialEq for HealthChecks {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<Vec<HealthCheck>> for HealthChecks {
    fn from(items: Vec<HealthCheck>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a HealthChecks {
    type Item = &'a HealthCheck;
    type IntoIter = std::slice::Iter<'a, HealthCheck>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorCase;

    fn http_check(path: &str) -> HealthCheck {
        HealthCheck::new(100, 1000, 3, 2, HealthChecker::Http(HttpHealthCheck::new(path)))
    }

    fn tcp_check() -> HealthCheck {
        HealthCheck::new(100, 1000, 3, 2, HealthChecker::Tcp(TcpHealthCheck::default()))
    }

    #[test]
    fn valid_checks() {
        assert!(http_check("/health").is_valid().is_ok());
        assert!(tcp_check().is_valid().is_ok());
    }

    #[test]
    fn unset_sorts_before_set() {
        let a = http_check("/h");
        let mut b = a.clone();
        b.interval_jitter_msec = Some(-100);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);

        let mut c = a.clone();
        c.reuse_connection = Some(false);
        assert_eq!(a.compare(&c), Ordering::Less);
    }

    #[test]
    fn earlier_fields_decide() {
        let mut a = http_check("/z");
        a.timeout_msec = 1;
        let b = http_check("/a");
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn tcp_sorts_before_http() {
        assert_eq!(tcp_check().compare(&http_check("/")), Ordering::Less);
        assert!(!tcp_check().equals(&http_check("/")));
    }

    #[test]
    fn required_fields_must_be_positive() {
        let mut hc = http_check("/h");
        hc.timeout_msec = 0;
        hc.healthy_threshold = -1;
        hc.no_traffic_interval_msec = Some(0);

        let err = hc.is_valid().unwrap_err();
        assert_eq!(
            err.errors,
            vec![
                ErrorCase::new("timeout_msec", MUST_BE_POSITIVE),
                ErrorCase::new("healthy_threshold", MUST_BE_POSITIVE),
                ErrorCase::new("no_traffic_interval_msec", MUST_BE_POSITIVE),
            ]
        );
    }

    #[test]
    fn sub_check_errors_are_scoped() {
        let err = http_check("").is_valid().unwrap_err();
        assert_eq!(
            err.errors,
            vec![ErrorCase::new("health_checker.http_health_check.path", MUST_NOT_BE_EMPTY)]
        );

        let mut tcp = TcpHealthCheck::default();
        tcp.send = "not base64!".to_string();
        tcp.receive = vec!["aGVsbG8=".to_string(), "%%%".to_string()];
        let err = HealthChecker::Tcp(tcp).is_valid().unwrap_err();
        let attrs: Vec<_> = err.iter().map(|e| e.attribute.as_str()).collect();
        assert_eq!(attrs, vec!["tcp_health_check.send", "tcp_health_check.receive[1]"]);
    }

    #[test]
    fn from_parts_requires_exactly_one() {
        let none = HealthChecker::from_parts(None, None).unwrap_err();
        assert_eq!(none.errors[0].msg, "must have one health check defined");

        let both = HealthChecker::from_parts(
            Some(HttpHealthCheck::default()),
            Some(TcpHealthCheck::default()),
        )
        .unwrap_err();
        assert_eq!(both.errors[0].msg, "must not have more than one type of health check defined");

        assert!(HealthChecker::from_parts(None, Some(TcpHealthCheck::default())).is_ok());
    }

    #[test]
    fn wire_form() {
        let json = r#"{
            "timeout_msec": 10, "interval_msec": 20,
            "unhealthy_threshold": 1, "healthy_threshold": 1,
            "health_checker": {"http_health_check": {"path": "/ping"}}
        }"#;
        let hc: HealthCheck = serde_json::from_str(json).unwrap();
        assert_eq!(hc.health_checker.http().map(|h| h.path.as_str()), Some("/ping"));

        let out = serde_json::to_value(&hc).unwrap();
        assert!(out["health_checker"]["tcp_health_check"].is_null());
        assert_eq!(out["health_checker"]["http_health_check"]["path"], "/ping");

        let both = r#"{
            "timeout_msec": 10, "interval_msec": 20,
            "unhealthy_threshold": 1, "healthy_threshold": 1,
            "health_checker": {"http_health_check": {}, "tcp_health_check": {}}
        }"#;
        assert!(serde_json::from_str::<HealthCheck>(both).is_err());
    }

    #[test]
    fn list_equality_does_not_reorder() {
        let a = HealthChecks::from(vec![http_check("/b"), tcp_check()]);
        let b = HealthChecks::from(vec![tcp_check(), http_check("/b")]);
        assert!(a.equals(&b));
        assert_eq!(a.0[0].health_checker.http().map(|h| h.path.as_str()), Some("/b"));
    }

    #[test]
    fn list_allows_one_check() {
        let list = HealthChecks::from(vec![http_check("/"), tcp_check()]);
        let err = list.is_valid().unwrap_err();
        assert_eq!(
            err.errors,
            vec![ErrorCase::new("health_checks", "only a single health check supported")]
        );

        let list = HealthChecks::from(vec![http_check("")]);
        let err = list.is_valid().unwrap_err();
        assert_eq!(err.errors[0].attribute, "health_checks[0].health_checker.http_health_check.path");
    }
}
