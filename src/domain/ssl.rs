//! TLS termination settings for a domain.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::comparison::unordered_eq;
use crate::validation::{check_index, Validation, ValidationError};

/// Cipher suites offered when a domain does not choose its own.
pub const DEFAULT_CIPHER_FILTER: &str = "EECDH+AESGCM:EDH+AESGCM:AES256+EECDH:AES256+EDH";

pub const SSL2: &str = "SSLv2";
pub const SSL3: &str = "SSLv3";
pub const TLS1: &str = "TLSv1";
pub const TLS1_1: &str = "TLSv1.1";
pub const TLS1_2: &str = "TLSv1.2";

/// Protocols enabled when a domain does not list any.
pub const DEFAULT_PROTOCOLS: [&str; 3] = [TLS1, TLS1_1, TLS1_2];

lazy_static! {
    /// Every protocol name a domain may enable.
    pub static ref SSL_PROTOCOLS: HashSet<&'static str> =
        [SSL2, SSL3, TLS1, TLS1_1, TLS1_2].into_iter().collect();
}

/// Paths to a certificate and its private key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertKeyPathPair {
    #[serde(default)]
    pub certificate_path: String,
    #[serde(default)]
    pub key_path: String,
}

impl CertKeyPathPair {
    pub fn new(certificate_path: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self { certificate_path: certificate_path.into(), key_path: key_path.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SslConfig {
    /// OpenSSL cipher filter; empty means [`DEFAULT_CIPHER_FILTER`]
    #[serde(default)]
    pub cipher_filter: String,

    /// Enabled protocol names; empty means [`DEFAULT_PROTOCOLS`]
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub protocols: Vec<String>,

    /// Certificate and key; exactly one pair is supported
    #[serde(default, deserialize_with = "crate::utils::null_as_default")]
    pub cert_key_pairs: Vec<CertKeyPathPair>,
}

impl SslConfig {
    /// A config serving a single certificate with default ciphers and
    /// protocols.
    pub fn with_cert(certificate_path: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            cert_key_pairs: vec![CertKeyPathPair::new(certificate_path, key_path)],
            ..Default::default()
        }
    }

    /// The cipher filter in effect.
    pub fn effective_cipher_filter(&self) -> &str {
        match self.cipher_filter.trim() {
            "" => DEFAULT_CIPHER_FILTER,
            filter => filter,
        }
    }

    /// The protocols in effect.
    pub fn effective_protocols(&self) -> Vec<&str> {
        if self.protocols.is_empty() {
            DEFAULT_PROTOCOLS.to_vec()
        } else {
            self.protocols.iter().map(String::as_str).collect()
        }
    }

    /// Cipher filters compare ignoring surrounding whitespace; protocols and
    /// certificate pairs compare regardless of order.
    pub fn equals(&self, other: &SslConfig) -> bool {
        self.cipher_filter.trim() == other.cipher_filter.trim()
            && unordered_eq(&self.protocols, &other.protocols)
            && unordered_eq(&self.cert_key_pairs, &other.cert_key_pairs)
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        for proto in &self.protocols {
            if !SSL_PROTOCOLS.contains(proto.as_str()) {
                errs.add("protocols", format!("invalid protocol specified {}", proto));
            }
        }

        match self.cert_key_pairs.as_slice() {
            [pair] => {
                let scope = format!("cert_key_pairs[{}]", pair.certificate_path);
                check_index(&pair.certificate_path, &mut errs, &format!("{}.certificate_path", scope));
                if pair.key_path.trim().is_empty() {
                    errs.add(format!("{}.key_path", scope), "may not be empty");
                }
            }
            _ => errs.add("cert_key_pairs", "a single SSL certificate and key pair must be specified"),
        }

        errs.or_nil()
    }
}

impl PartialEq for SslConfig {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorCase;

    #[test]
    fn single_pair_is_valid() {
        assert!(SslConfig::with_cert("/etc/cert.pem", "/etc/key.pem").is_valid().is_ok());
    }

    #[test]
    fn requires_exactly_one_pair() {
        let none = SslConfig::default().is_valid().unwrap_err();
        assert_eq!(
            none.errors,
            vec![ErrorCase::new("cert_key_pairs", "a single SSL certificate and key pair must be specified")]
        );

        let mut two = SslConfig::with_cert("/a", "/b");
        two.cert_key_pairs.push(CertKeyPathPair::new("/c", "/d"));
        assert!(two.is_valid().is_err());
    }

    #[test]
    fn pair_fields_are_checked() {
        let cfg = SslConfig::with_cert("/cert", " ");
        let err = cfg.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("cert_key_pairs[/cert].key_path", "may not be empty")]);
    }

    #[test]
    fn unknown_protocol() {
        let mut cfg = SslConfig::with_cert("/cert", "/key");
        cfg.protocols = vec![TLS1_2.to_string(), "TLSv9".to_string()];
        let err = cfg.is_valid().unwrap_err();
        assert_eq!(err.errors, vec![ErrorCase::new("protocols", "invalid protocol specified TLSv9")]);
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = SslConfig::with_cert("/cert", "/key");
        assert_eq!(cfg.effective_cipher_filter(), DEFAULT_CIPHER_FILTER);
        assert_eq!(cfg.effective_protocols(), vec!["TLSv1", "TLSv1.1", "TLSv1.2"]);
    }

    #[test]
    fn equality_trims_filter_and_ignores_order() {
        let mut a = SslConfig::with_cert("/cert", "/key");
        a.cipher_filter = " HIGH ".to_string();
        a.protocols = vec![TLS1.to_string(), TLS1_2.to_string()];

        let mut b = SslConfig::with_cert("/cert", "/key");
        b.cipher_filter = "HIGH".to_string();
        b.protocols = vec![TLS1_2.to_string(), TLS1.to_string()];

        assert!(a.equals(&b));
        b.cert_key_pairs[0].key_path = "/other".to_string();
        assert!(!a.equals(&b));
    }
}
