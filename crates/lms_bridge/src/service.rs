//! LMS transport contracts and baseline adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use scorm_runtime_contract::{DataKey, PendingWrite, SnapshotMap, WriteResult};

/// Object-safe boxed future used by [`LmsService`] async methods.
pub type LmsServiceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Remote persistence service consumed by the bridge.
///
/// `get_value` and `initial_snapshot` are deliberately synchronous: the
/// legacy runtime contract blocks the caller on reads, so browser adapters
/// back them with a synchronous round-trip. Write batches are the only
/// suspension point and go through a boxed local future.
pub trait LmsService {
    /// Blocking round-trip for one data key.
    fn get_value(&self, key: &DataKey) -> Result<String, String>;

    /// Dispatches one ordered write batch and returns per-write results
    /// positionally aligned to the input.
    fn set_values<'a>(
        &'a self,
        batch: &'a [PendingWrite],
    ) -> LmsServiceFuture<'a, Result<Vec<WriteResult>, String>>;

    /// Fetches the initial value snapshot; consumed once at bootstrap.
    fn initial_snapshot(&self) -> Result<SnapshotMap, String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op transport for unsupported targets and baseline tests: every key
/// reads as empty and writes are acknowledged without results.
pub struct NoopLmsService;

impl LmsService for NoopLmsService {
    fn get_value(&self, _key: &DataKey) -> Result<String, String> {
        Ok(String::new())
    }

    fn set_values<'a>(
        &'a self,
        batch: &'a [PendingWrite],
    ) -> LmsServiceFuture<'a, Result<Vec<WriteResult>, String>> {
        let len = batch.len();
        Box::pin(async move { Ok(vec![WriteResult::default(); len]) })
    }

    fn initial_snapshot(&self) -> Result<SnapshotMap, String> {
        Ok(SnapshotMap::new())
    }
}

#[derive(Debug, Default)]
struct MemoryLmsState {
    values: HashMap<String, String>,
    dispatched: Vec<Vec<PendingWrite>>,
    fail_writes: bool,
    fail_reads: bool,
    fail_snapshot: bool,
}

/// In-memory transport that applies batches to a local map and records every
/// dispatched batch in order, with failure injection for recovery tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLmsService {
    inner: Rc<RefCell<MemoryLmsState>>,
}

impl MemoryLmsService {
    /// Builds a service whose snapshot and reads answer from `values`.
    pub fn with_values(values: SnapshotMap) -> Self {
        let service = Self::default();
        service.inner.borrow_mut().values = values;
        service
    }

    /// Makes subsequent write batches fail until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Makes subsequent reads fail until cleared.
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    /// Makes the initial snapshot fetch fail until cleared.
    pub fn set_fail_snapshot(&self, fail: bool) {
        self.inner.borrow_mut().fail_snapshot = fail;
    }

    /// Returns every batch dispatched so far, in dispatch order.
    ///
    /// Failed batches are recorded too; the queue discards them after the
    /// exchange, not before.
    pub fn dispatched_batches(&self) -> Vec<Vec<PendingWrite>> {
        self.inner.borrow().dispatched.clone()
    }

    /// Returns the server-side value for a key, if any write reached it.
    pub fn stored_value(&self, key: &DataKey) -> Option<String> {
        self.inner.borrow().values.get(key.as_str()).cloned()
    }
}

impl LmsService for MemoryLmsService {
    fn get_value(&self, key: &DataKey) -> Result<String, String> {
        let state = self.inner.borrow();
        if state.fail_reads {
            return Err("simulated read failure".to_string());
        }
        Ok(state.values.get(key.as_str()).cloned().unwrap_or_default())
    }

    fn set_values<'a>(
        &'a self,
        batch: &'a [PendingWrite],
    ) -> LmsServiceFuture<'a, Result<Vec<WriteResult>, String>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            state.dispatched.push(batch.to_vec());
            if state.fail_writes {
                return Err("simulated write failure".to_string());
            }
            for write in batch {
                state
                    .values
                    .insert(write.key.as_str().to_string(), write.value.clone());
            }
            Ok(vec![WriteResult::default(); batch.len()])
        })
    }

    fn initial_snapshot(&self) -> Result<SnapshotMap, String> {
        let state = self.inner.borrow();
        if state.fail_snapshot {
            return Err("simulated snapshot failure".to_string());
        }
        Ok(state.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn memory_service_applies_batches_in_order_and_records_them() {
        let service = MemoryLmsService::default();
        let service_obj: &dyn LmsService = &service;

        let batch = vec![
            PendingWrite::new("cmi.core.lesson_location", "page-1"),
            PendingWrite::new("cmi.core.lesson_location", "page-2"),
        ];
        let results = block_on(service_obj.set_values(&batch)).expect("set values");
        assert_eq!(results.len(), 2);

        // Repeated keys transmit both entries; the later one wins server-side.
        assert_eq!(
            service.stored_value(&DataKey::new("cmi.core.lesson_location")),
            Some("page-2".to_string())
        );
        assert_eq!(service.dispatched_batches(), vec![batch]);
    }

    #[test]
    fn memory_service_failure_injection_keeps_values_untouched() {
        let service = MemoryLmsService::default();
        service.set_fail_writes(true);

        let batch = vec![PendingWrite::new("cmi.suspend_data", "xyz")];
        let err = block_on(service.set_values(&batch)).expect_err("expected failure");
        assert!(err.contains("write failure"));
        assert_eq!(service.stored_value(&DataKey::new("cmi.suspend_data")), None);
        assert_eq!(service.dispatched_batches().len(), 1);
    }

    #[test]
    fn noop_service_reads_empty_and_acknowledges_writes() {
        let service = NoopLmsService;
        let service_obj: &dyn LmsService = &service;
        assert_eq!(
            service_obj.get_value(&DataKey::new("cmi.mode")).expect("get"),
            ""
        );
        let results = block_on(
            service_obj.set_values(&[PendingWrite::new("cmi.mode", "browse")]),
        )
        .expect("set");
        assert_eq!(results, vec![WriteResult::default()]);
        assert_eq!(service_obj.initial_snapshot().expect("snapshot").len(), 0);
    }
}
