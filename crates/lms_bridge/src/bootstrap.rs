//! Session bootstrap: variant selection, cache seeding, and bridge wiring.

use std::rc::Rc;

use scorm_runtime_contract::{BridgeConfig, ScormVersion};

use crate::api::RuntimeApi;
use crate::cache::{UncachedKeySet, ValueCache};
use crate::display::{FullscreenPresenter, StatusSink};
use crate::queue::{TaskSpawner, WriteQueue};
use crate::resolver::ReadResolver;
use crate::service::LmsService;

/// One bootstrapped playback session.
///
/// The facade is reference-counted so a popup window can mirror the *same*
/// instance: queue state stays single-owner even when two windows call in.
pub struct SessionBridge {
    /// Shared synchronous facade for the selected variant.
    pub api: Rc<RuntimeApi>,
    /// Variant selected from configuration.
    pub version: ScormVersion,
    /// Set when the initial snapshot could not be fetched and the session
    /// started over an empty cache instead.
    pub seed_error: Option<String>,
}

/// Builds the cache, resolver, queue, and facade for one playback session.
///
/// The cache is seeded from the service's initial snapshot. A snapshot
/// failure does not abort the session: content still needs a working API
/// object, so the bridge starts over an empty cache (cacheable reads fall
/// back to round-trips) and reports the failure in
/// [`SessionBridge::seed_error`] for host-side diagnostics.
pub fn bootstrap_session(
    config: &BridgeConfig,
    service: Rc<dyn LmsService>,
    sink: Rc<dyn StatusSink>,
    fullscreen: Rc<dyn FullscreenPresenter>,
    spawner: Rc<dyn TaskSpawner>,
) -> SessionBridge {
    let version = config.version();
    let uncached = match &config.uncached_keys {
        Some(keys) => UncachedKeySet::new(keys.iter().cloned()),
        None => UncachedKeySet::default(),
    };

    let cache = ValueCache::default();
    let seed_error = match service.initial_snapshot() {
        Ok(snapshot) => {
            cache.seed(snapshot);
            None
        }
        Err(detail) => Some(detail),
    };

    let resolver = ReadResolver::new(cache.clone(), uncached.clone(), service.clone());
    let queue = WriteQueue::new(cache, uncached, service, sink, spawner);
    let api = Rc::new(RuntimeApi::new(
        version,
        resolver,
        queue,
        fullscreen,
        config.fullscreen_on_first_write,
    ));

    SessionBridge {
        api,
        version,
        seed_error,
    }
}
