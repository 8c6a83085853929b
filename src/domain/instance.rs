//! Backend instance types
//!
//! An [`Instance`] is a single host:port serving a cluster, tagged with
//! metadata that cluster constraints select on.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::metadata::{metadata_valid, Metadata, Metadatum};
use crate::validation::{
    Validation, ValidationError, ALLOWED_INDEX_PATTERN, ALLOWED_INDEX_PATTERN_MATCH_FAILURE,
    HOST_PATTERN, HOST_PATTERN_MATCH_FAILURE, MUST_NOT_BE_EMPTY,
};

/// A single backend endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Instance {
    /// Host name or address
    #[serde(default)]
    pub host: String,

    /// Port; zero is unset and never valid
    #[serde(default)]
    pub port: u16,

    /// Tags used by cluster constraints to select this instance
    #[serde(default)]
    pub metadata: Metadata,
}

impl Instance {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, metadata: Metadata::default() }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Identity of the instance within its cluster: `host:port`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when nothing has been set.
    pub fn is_nil(&self) -> bool {
        self.host.is_empty() && self.port == 0 && self.metadata.is_empty()
    }

    pub fn equals(&self, other: &Instance) -> bool {
        self.host == other.host && self.port == other.port && self.metadata.equals(&other.metadata)
    }

    /// Same host and port with an equivalent tag set.
    pub fn equivalent(&self, other: &Instance) -> bool {
        self.host == other.host
            && self.port == other.port
            && self.metadata.equivalent(&other.metadata)
    }

    /// Check host, port and metadata. Attributes are relative to the instance.
    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        if self.host.is_empty() {
            errs.add("host", MUST_NOT_BE_EMPTY);
        } else if !HOST_PATTERN.is_match(&self.host) {
            errs.add("host", HOST_PATTERN_MATCH_FAILURE);
        }

        if self.port == 0 {
            errs.add("port", "must be non-zero");
        }

        errs.merge(instance_metadata_valid(&self.metadata));

        errs.or_nil()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// Instance tags need keys usable as a path index; values are free-form.
pub fn instance_metadata_valid(md: &Metadata) -> Validation {
    let check_key = |datum: &Metadatum| -> Validation {
        if ALLOWED_INDEX_PATTERN.is_match(&datum.key) {
            Ok(())
        } else {
            Err(ValidationError::single("key", ALLOWED_INDEX_PATTERN_MATCH_FAILURE))
        }
    };
    metadata_valid("metadata", md, &[&check_key])
}

/// The instances of a cluster. Order is not significant.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Instances(Vec<Instance>);

impl<'de> Deserialize<'de> for Instances {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(crate::utils::null_as_default(deserializer)?))
    }
}

impl Instances {
    pub fn new(items: Vec<Instance>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instance> {
        self.0.iter()
    }

    pub fn push(&mut self, instance: Instance) {
        self.0.push(instance);
    }

    pub fn as_slice(&self) -> &[Instance] {
        &self.0
    }

    /// Instances indexed by `host:port`.
    pub fn as_map(&self) -> HashMap<String, &Instance> {
        self.0.iter().map(|i| (i.key(), i)).collect()
    }

    /// Equal by content regardless of position. A missing list equals an
    /// empty one.
    pub fn equals(&self, other: &Instances) -> bool {
        self.compare_by_key(other, Instance::equals)
    }

    pub fn equivalent(&self, other: &Instances) -> bool {
        self.compare_by_key(other, Instance::equivalent)
    }

    fn compare_by_key(&self, other: &Instances, eq: impl Fn(&Instance, &Instance) -> bool) -> bool {
        if self.len() != other.len() {
            return false;
        }

        let mut theirs: HashMap<String, Vec<&Instance>> = HashMap::new();
        for inst in &other.0 {
            theirs.entry(inst.key()).or_default().push(inst);
        }

        for inst in &self.0 {
            let Some(candidates) = theirs.get_mut(&inst.key()) else {
                return false;
            };
            match candidates.iter().position(|c| eq(inst, *c)) {
                Some(idx) => {
                    candidates.swap_remove(idx);
                }
                None => return false,
            }
        }

        true
    }

    /// Reports duplicate `host:port` keys under `instances` and each
    /// instance's failures under `instances[host:port]`.
    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();
        let mut seen = HashSet::new();

        for inst in &self.0 {
            let key = inst.key();
            if !seen.insert(key.clone()) {
                errs.add("instances", format!("multiple instances of key {}", key));
            }
            errs.merge_prefixed(inst.is_valid(), &format!("instances[{}]", key));
        }

        errs.or_nil()
    }

    /// Sort by host, then port.
    pub fn sort_by_host_port(&mut self) {
        self.0.sort_by(|a, b| a.host.cmp(&b.host).then(a.port.cmp(&b.port)));
    }
}

impl PartialEq for Instances {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<Vec<Instance>> for Instances {
    fn from(items: Vec<Instance>) -> Self {
        Self(items)
    }
}

impl FromIterator<Instance> for Instances {
    fn from_iter<I: IntoIterator<Item = Instance>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Instances {
    type Item = &'a Instance;
    type IntoIter = std::slice::Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
