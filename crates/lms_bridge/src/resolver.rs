//! Per-read routing between the value cache and blocking round-trips.

use std::rc::Rc;

use scorm_runtime_contract::DataKey;

use crate::cache::{UncachedKeySet, ValueCache};
use crate::service::LmsService;

/// Decides, per read request, whether the cache can answer or a blocking
/// round-trip is required.
#[derive(Clone)]
pub struct ReadResolver {
    cache: ValueCache,
    uncached: UncachedKeySet,
    service: Rc<dyn LmsService>,
}

impl ReadResolver {
    /// Builds a resolver over one session's cache and transport.
    pub fn new(cache: ValueCache, uncached: UncachedKeySet, service: Rc<dyn LmsService>) -> Self {
        Self {
            cache,
            uncached,
            service,
        }
    }

    /// Resolves one read.
    ///
    /// Keys in the uncached set always round-trip so server-computed grading
    /// stays fresh; their results never enter the cache. Cacheable keys
    /// answer from cache when present and read through otherwise. A failed
    /// round-trip yields the empty string, the only failure signal the
    /// legacy contract allows.
    pub fn read(&self, key: &DataKey) -> String {
        if self.uncached.contains(key) {
            return self.service.get_value(key).unwrap_or_default();
        }
        if let Some(value) = self.cache.get(key) {
            return value;
        }
        self.service.get_value(key).unwrap_or_default()
    }
}
