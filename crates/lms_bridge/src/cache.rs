//! Session-scoped value cache and the always-authoritative key set.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use scorm_runtime_contract::{DataKey, SnapshotMap, DEFAULT_UNCACHED_KEYS};

/// Last known value per data key for the current playback session.
///
/// Seeded once at bootstrap from the server snapshot and updated
/// optimistically when writes are enqueued; reads never block on it.
#[derive(Debug, Clone, Default)]
pub struct ValueCache {
    inner: Rc<RefCell<HashMap<String, String>>>,
}

impl ValueCache {
    /// Installs the initial set of known values.
    ///
    /// Seeding is last-write-wins per key, so repeating the same snapshot is
    /// idempotent.
    pub fn seed(&self, snapshot: SnapshotMap) {
        self.inner.borrow_mut().extend(snapshot);
    }

    /// Pure lookup; `None` is the normal outcome for keys never seen.
    pub fn get(&self, key: &DataKey) -> Option<String> {
        self.inner.borrow().get(key.as_str()).cloned()
    }

    /// Overwrite-or-insert; last write wins per key.
    pub fn put(&self, key: &DataKey, value: impl Into<String>) {
        self.inner
            .borrow_mut()
            .insert(key.as_str().to_string(), value.into());
    }
}

/// Fixed set of data keys whose authoritative value can change server-side
/// and must always be read through a round-trip.
#[derive(Debug, Clone)]
pub struct UncachedKeySet {
    keys: Rc<HashSet<String>>,
}

impl UncachedKeySet {
    /// Builds a key set from an explicit list (server-supplied override).
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: Rc::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Membership test deciding the read path for a key.
    pub fn contains(&self, key: &DataKey) -> bool {
        self.keys.contains(key.as_str())
    }
}

impl Default for UncachedKeySet {
    /// Bridge-default set: completion/success status and raw score fields.
    fn default() -> Self {
        Self::new(DEFAULT_UNCACHED_KEYS.iter().copied())
    }
}
