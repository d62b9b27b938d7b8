//! Aggregation of repeated observations into running per-entity collections.
//!
//! Merges are monotonic unions: nothing already stored is replaced or
//! removed, so re-merging an overlapping fetch is idempotent and reports
//! no change.

use crate::model::{LikeEvent, Post};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Union `incoming` into `self`, returning whether anything was added.
pub trait Merge {
    fn merge(&mut self, incoming: Self) -> bool;
}

/// Value-style merge: `(merged, changed)`.
pub fn merge<T: Merge>(mut existing: T, incoming: T) -> (T, bool) {
    let changed = existing.merge(incoming);
    (existing, changed)
}

/// String-keyed collection that keeps insertion order.
///
/// Serialized as a JSON object whose key order is the insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyedCollection<V>(IndexMap<String, V>);

impl<V> Default for KeyedCollection<V> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl<V> KeyedCollection<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.get(key)
    }

    /// Insert unless the key is already present. Returns whether it was inserted.
    pub fn insert_new(&mut self, key: impl Into<String>, value: V) -> bool {
        match self.0.entry(key.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Entry for `key`, appended with `make()` when missing.
    pub fn entry_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> &mut V {
        self.0.entry(key.to_string()).or_insert_with(make)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<V> IntoIterator for KeyedCollection<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<V> FromIterator<(String, V)> for KeyedCollection<V> {
    /// Later duplicates of a key are dropped.
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (key, value) in iter {
            collection.insert_new(key, value);
        }
        collection
    }
}

/// Timeline posts keyed by post id. First-seen wins: a refetched post never
/// replaces the stored one, so like and comment counts keep their first value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostCollection(pub KeyedCollection<Post>);

impl PostCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a post unless its id is already present.
    pub fn add(&mut self, post: Post) -> bool {
        self.0.insert_new(post.id.to_string(), post)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.0.iter().map(|(_, post)| post)
    }
}

impl Merge for PostCollection {
    fn merge(&mut self, incoming: Self) -> bool {
        let mut changed = false;
        for (_, post) in incoming.0 {
            changed |= self.add(post);
        }
        changed
    }
}

/// Like events grouped by liker, unique by post id per liker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikeCollection(pub KeyedCollection<Vec<LikeEvent>>);

impl LikeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `liker` liked a post. Returns whether the event was new.
    pub fn add(&mut self, liker: &str, event: LikeEvent) -> bool {
        let events = self.0.entry_or_insert_with(liker, Vec::new);
        if events.iter().any(|e| e.post_id == event.post_id) {
            return false;
        }
        events.push(event);
        true
    }

    pub fn events(&self, liker: &str) -> &[LikeEvent] {
        self.0.get(liker).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Merge for LikeCollection {
    fn merge(&mut self, incoming: Self) -> bool {
        let mut changed = false;
        for (liker, events) in incoming.0 {
            for event in events {
                changed |= self.add(&liker, event);
            }
        }
        changed
    }
}

/// Presence timestamps per entity id, append-only in first-observed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresenceLog(pub KeyedCollection<Vec<i64>>);

impl PresenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a timestamp unless the entity already has it.
    pub fn observe(&mut self, entity: &str, timestamp: i64) -> bool {
        let seen = self.0.entry_or_insert_with(entity, Vec::new);
        if seen.contains(&timestamp) {
            return false;
        }
        seen.push(timestamp);
        true
    }

    pub fn timestamps(&self, entity: &str) -> &[i64] {
        self.0.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, i64)> for PresenceLog {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut log = Self::new();
        for (entity, timestamp) in iter {
            log.observe(&entity, timestamp);
        }
        log
    }
}

impl Merge for PresenceLog {
    fn merge(&mut self, incoming: Self) -> bool {
        let mut changed = false;
        for (entity, timestamps) in incoming.0 {
            for timestamp in timestamps {
                changed |= self.observe(&entity, timestamp);
            }
        }
        changed
    }
}
