//! Change sets between two snapshots of the same org

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::domain::{KeyedEntity, ObjectType};
use crate::snapshot::ConfigSnapshot;

/// Keys of one entity type grouped by how they changed.
///
/// `modified` entities differ in payload. `touched` entities have the same
/// payload but a new checksum, i.e. were written without a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
    pub touched: Vec<String>,
    pub unchanged: Vec<String>,
}

impl EntityDiff {
    /// Diff two collections by key. Added, modified, touched and unchanged
    /// keys follow the order of `after`; removed keys the order of `before`.
    pub fn of<'a, T, B, A>(before: B, after: A) -> Self
    where
        T: KeyedEntity + 'a,
        B: IntoIterator<Item = &'a T>,
        A: IntoIterator<Item = &'a T>,
    {
        let before: Vec<&T> = before.into_iter().collect();
        let by_key: HashMap<&str, &T> = before.iter().map(|e| (e.key(), *e)).collect();

        let mut diff = Self::default();
        let mut seen = std::collections::HashSet::new();

        for new in after {
            let key = new.key();
            seen.insert(key);
            let bucket = match by_key.get(key) {
                None => &mut diff.added,
                Some(old) if !old.equivalent(new) => &mut diff.modified,
                Some(old) if !old.equals(new) => &mut diff.touched,
                Some(_) => &mut diff.unchanged,
            };
            bucket.push(key.to_string());
        }

        diff.removed = before
            .iter()
            .map(|e| e.key())
            .filter(|k| !seen.contains(k))
            .map(str::to_string)
            .collect();

        diff
    }

    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty())
    }
}

/// Per-type change sets, keyed by [`ObjectType`] in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub entities: BTreeMap<ObjectType, EntityDiff>,
}

impl SnapshotDiff {
    pub fn between(before: &ConfigSnapshot, after: &ConfigSnapshot) -> Self {
        let mut entities = BTreeMap::new();

        entities.insert(ObjectType::Org, EntityDiff::of([&before.org], [&after.org]));
        entities.insert(ObjectType::User, EntityDiff::of(&before.users, &after.users));
        entities.insert(ObjectType::Zone, EntityDiff::of(&before.zones, &after.zones));
        entities.insert(ObjectType::Proxy, EntityDiff::of(&before.proxies, &after.proxies));
        entities.insert(ObjectType::Domain, EntityDiff::of(&before.domains, &after.domains));
        entities.insert(ObjectType::Route, EntityDiff::of(&before.routes, &after.routes));
        entities.insert(ObjectType::Cluster, EntityDiff::of(&before.clusters, &after.clusters));
        entities.insert(ObjectType::SharedRules, EntityDiff::of(&before.shared_rules, &after.shared_rules));
        entities.insert(ObjectType::AccessToken, EntityDiff::of(&before.access_tokens, &after.access_tokens));
        entities.insert(ObjectType::Listener, EntityDiff::of(&before.listeners, &after.listeners));

        let diff = Self { entities };
        if diff.has_changes() {
            for (object_type, entity_diff) in diff.entities.iter().filter(|(_, d)| d.has_changes()) {
                tracing::debug!(
                    object_type = object_type.name(),
                    added = entity_diff.added.len(),
                    removed = entity_diff.removed.len(),
                    modified = entity_diff.modified.len(),
                    "Snapshot changes"
                );
            }
        }
        diff
    }

    pub fn get(&self, object_type: ObjectType) -> Option<&EntityDiff> {
        self.entities.get(&object_type)
    }

    /// True if any entity was added, removed or modified. Touched entities
    /// do not count.
    pub fn has_changes(&self) -> bool {
        self.entities.values().any(EntityDiff::has_changes)
    }

    pub fn is_empty(&self) -> bool {
        !self.has_changes()
    }
}
