//! Ordered, batching write pipeline with an at-most-one-in-flight discipline.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use scorm_runtime_contract::{DataKey, PendingWrite, WriteResult};

use crate::cache::{UncachedKeySet, ValueCache};
use crate::display::StatusSink;
use crate::service::LmsService;

/// Detached task driving one session's queue consumer loop.
pub type QueueTask = LocalBoxFuture<'static, ()>;

/// Spawns detached bridge tasks onto the host's single-threaded executor.
pub trait TaskSpawner {
    /// Schedules `task` to run cooperatively.
    fn spawn_task(&self, task: QueueTask);
}

/// [`TaskSpawner`] over a `futures` [`LocalSpawner`]; native wiring and the
/// deterministic driver for tests.
///
/// [`LocalSpawner`]: futures::executor::LocalSpawner
#[derive(Debug, Clone)]
pub struct LocalPoolTaskSpawner(pub futures::executor::LocalSpawner);

impl TaskSpawner for LocalPoolTaskSpawner {
    fn spawn_task(&self, task: QueueTask) {
        // Spawning fails only once the pool has shut down, which in this
        // model means the session is over; the task is dropped with it.
        let _ = self.0.spawn_local(task);
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<PendingWrite>,
    exchange_in_flight: bool,
}

/// FIFO queue of pending writes drained as whole batches through a single
/// in-flight network exchange.
///
/// `enqueue` returns immediately after the optimistic cache write, which is
/// what lets the synchronous facade answer without waiting on the network.
/// Writes arriving while an exchange is in flight are held for the next
/// batch, never interleaved, so server-observed order equals enqueue order.
#[derive(Clone)]
pub struct WriteQueue {
    state: Rc<RefCell<QueueState>>,
    cache: ValueCache,
    uncached: UncachedKeySet,
    service: Rc<dyn LmsService>,
    sink: Rc<dyn StatusSink>,
    spawner: Rc<dyn TaskSpawner>,
}

impl WriteQueue {
    /// Builds the coordinator for one session.
    pub fn new(
        cache: ValueCache,
        uncached: UncachedKeySet,
        service: Rc<dyn LmsService>,
        sink: Rc<dyn StatusSink>,
        spawner: Rc<dyn TaskSpawner>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState::default())),
            cache,
            uncached,
            service,
            sink,
            spawner,
        }
    }

    /// Appends a write, updates the cache optimistically for cacheable keys,
    /// and triggers a drain. Returns without waiting for confirmation.
    ///
    /// Keys in the uncached set are transmitted but never cached: reads for
    /// them always round-trip, so a local copy would never be consulted.
    pub fn enqueue(&self, key: DataKey, value: impl Into<String>) {
        let value = value.into();
        if !self.uncached.contains(&key) {
            self.cache.put(&key, value.clone());
        }
        self.state
            .borrow_mut()
            .pending
            .push_back(PendingWrite { key, value });
        self.drain();
    }

    /// Returns whether the queue is empty with no exchange outstanding.
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.pending.is_empty() && !state.exchange_in_flight
    }

    fn drain(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.exchange_in_flight || state.pending.is_empty() {
                return;
            }
            state.exchange_in_flight = true;
        }
        let queue = self.clone();
        self.spawner.spawn_task(Box::pin(queue.run_exchanges()));
    }

    /// Queue consumer loop: take the whole pending batch, await the exchange,
    /// repeat until empty, then quiesce.
    async fn run_exchanges(self) {
        loop {
            let batch: Vec<PendingWrite> = {
                let mut state = self.state.borrow_mut();
                if state.pending.is_empty() {
                    state.exchange_in_flight = false;
                    return;
                }
                state.pending.drain(..).collect()
            };
            // A failed batch is discarded without retry; the cache still
            // holds the optimistic value for every cacheable key and the
            // loop moves on to writes enqueued in the meantime.
            if let Ok(results) = self.service.set_values(&batch).await {
                self.forward_results(&results);
            }
        }
    }

    fn forward_results(&self, results: &[WriteResult]) {
        for result in results {
            if let Some(lesson_score) = result.lesson_score {
                self.sink.lesson_score_changed(lesson_score);
            }
            if let Some(status) = result.completion_status.as_deref() {
                self.sink.completion_status_changed(status);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use pretty_assertions::assert_eq;
    use scorm_runtime_contract::SnapshotMap;

    use super::*;
    use crate::display::{MemoryStatusSink, NoopStatusSink};
    use crate::service::{LmsServiceFuture, MemoryLmsService};

    fn key(raw: &str) -> DataKey {
        DataKey::new(raw)
    }

    struct Harness {
        pool: LocalPool,
        queue: WriteQueue,
        service: MemoryLmsService,
    }

    fn harness_with(sink: Rc<dyn StatusSink>, service: MemoryLmsService) -> Harness {
        let pool = LocalPool::new();
        let spawner = Rc::new(LocalPoolTaskSpawner(pool.spawner()));
        let queue = WriteQueue::new(
            ValueCache::default(),
            UncachedKeySet::default(),
            Rc::new(service.clone()),
            sink,
            spawner,
        );
        Harness {
            pool,
            queue,
            service,
        }
    }

    fn harness() -> Harness {
        harness_with(Rc::new(NoopStatusSink), MemoryLmsService::default())
    }

    #[test]
    fn writes_enqueued_before_a_drain_form_one_ordered_batch() {
        let mut h = harness();
        h.queue.enqueue(key("cmi.core.lesson_status"), "completed");
        h.queue.enqueue(key("cmi.suspend_data"), "xyz");
        h.pool.run_until_stalled();

        assert_eq!(
            h.service.dispatched_batches(),
            vec![vec![
                PendingWrite::new("cmi.core.lesson_status", "completed"),
                PendingWrite::new("cmi.suspend_data", "xyz"),
            ]]
        );
        assert!(h.queue.is_idle());
    }

    #[test]
    fn enqueue_writes_through_to_cache_before_confirmation() {
        let h = harness();
        h.queue.enqueue(key("cmi.suspend_data"), "xyz");
        // No pool turn yet: nothing has been confirmed by the network.
        assert_eq!(
            h.queue.cache.get(&key("cmi.suspend_data")),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn uncached_key_writes_skip_the_cache_but_still_transmit() {
        let mut h = harness();
        h.queue.enqueue(key("cmi.core.score.raw"), "85");
        h.pool.run_until_stalled();

        assert_eq!(h.queue.cache.get(&key("cmi.core.score.raw")), None);
        assert_eq!(
            h.service.dispatched_batches(),
            vec![vec![PendingWrite::new("cmi.core.score.raw", "85")]]
        );
    }

    #[test]
    fn repeated_keys_transmit_both_entries_in_order() {
        let mut h = harness();
        h.queue.enqueue(key("cmi.core.lesson_location"), "page-1");
        h.queue.enqueue(key("cmi.core.lesson_location"), "page-2");
        h.pool.run_until_stalled();

        assert_eq!(
            h.service.dispatched_batches(),
            vec![vec![
                PendingWrite::new("cmi.core.lesson_location", "page-1"),
                PendingWrite::new("cmi.core.lesson_location", "page-2"),
            ]]
        );
        assert_eq!(
            h.queue.cache.get(&key("cmi.core.lesson_location")),
            Some("page-2".to_string())
        );
    }

    /// Transport whose exchanges stay pending until the test releases them.
    #[derive(Default)]
    struct GatedService {
        gates: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
        dispatched: Rc<RefCell<Vec<Vec<PendingWrite>>>>,
    }

    impl GatedService {
        fn release_next(&self) {
            let gate = self.gates.borrow_mut().remove(0);
            let _ = gate.send(());
        }
    }

    impl LmsService for GatedService {
        fn get_value(&self, _key: &DataKey) -> Result<String, String> {
            Ok(String::new())
        }

        fn set_values<'a>(
            &'a self,
            batch: &'a [PendingWrite],
        ) -> LmsServiceFuture<'a, Result<Vec<WriteResult>, String>> {
            self.dispatched.borrow_mut().push(batch.to_vec());
            let (sender, receiver) = oneshot::channel();
            self.gates.borrow_mut().push(sender);
            let len = batch.len();
            Box::pin(async move {
                let _ = receiver.await;
                Ok(vec![WriteResult::default(); len])
            })
        }

        fn initial_snapshot(&self) -> Result<SnapshotMap, String> {
            Ok(SnapshotMap::new())
        }
    }

    #[test]
    fn bursts_during_an_in_flight_exchange_wait_for_the_next_batch() {
        let mut pool = LocalPool::new();
        let service = Rc::new(GatedService::default());
        let queue = WriteQueue::new(
            ValueCache::default(),
            UncachedKeySet::default(),
            service.clone(),
            Rc::new(NoopStatusSink),
            Rc::new(LocalPoolTaskSpawner(pool.spawner())),
        );

        queue.enqueue(key("cmi.core.lesson_status"), "incomplete");
        pool.run_until_stalled();
        assert_eq!(service.dispatched.borrow().len(), 1);

        // Burst while the first exchange is outstanding.
        queue.enqueue(key("cmi.suspend_data"), "a");
        queue.enqueue(key("cmi.suspend_data"), "b");
        pool.run_until_stalled();
        assert_eq!(service.dispatched.borrow().len(), 1, "at most one in flight");

        service.release_next();
        pool.run_until_stalled();
        assert_eq!(service.dispatched.borrow().len(), 2);
        assert_eq!(
            service.dispatched.borrow()[1],
            vec![
                PendingWrite::new("cmi.suspend_data", "a"),
                PendingWrite::new("cmi.suspend_data", "b"),
            ]
        );

        service.release_next();
        pool.run_until_stalled();
        assert!(queue.is_idle());
    }

    #[test]
    fn failed_batch_is_discarded_and_the_queue_recovers() {
        let mut h = harness();
        h.service.set_fail_writes(true);
        h.queue.enqueue(key("cmi.suspend_data"), "lost");
        h.pool.run_until_stalled();
        assert!(h.queue.is_idle(), "failure must not wedge the queue");

        h.service.set_fail_writes(false);
        h.queue.enqueue(key("cmi.suspend_data"), "kept");
        h.pool.run_until_stalled();

        let batches = h.service.dispatched_batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], vec![PendingWrite::new("cmi.suspend_data", "kept")]);
        assert_eq!(
            h.service.stored_value(&key("cmi.suspend_data")),
            Some("kept".to_string())
        );
    }

    /// Transport answering fixed per-write results for sink forwarding tests.
    struct ResultService(Vec<WriteResult>);

    impl LmsService for ResultService {
        fn get_value(&self, _key: &DataKey) -> Result<String, String> {
            Ok(String::new())
        }

        fn set_values<'a>(
            &'a self,
            _batch: &'a [PendingWrite],
        ) -> LmsServiceFuture<'a, Result<Vec<WriteResult>, String>> {
            let results = self.0.clone();
            Box::pin(async move { Ok(results) })
        }

        fn initial_snapshot(&self) -> Result<SnapshotMap, String> {
            Ok(SnapshotMap::new())
        }
    }

    #[test]
    fn ui_relevant_result_fields_are_forwarded_to_the_sink() {
        let mut pool = LocalPool::new();
        let sink = MemoryStatusSink::default();
        let queue = WriteQueue::new(
            ValueCache::default(),
            UncachedKeySet::default(),
            Rc::new(ResultService(vec![
                WriteResult {
                    completion_status: Some("completed".to_string()),
                    lesson_score: Some(0.85),
                },
                WriteResult::default(),
            ])),
            Rc::new(sink.clone()),
            Rc::new(LocalPoolTaskSpawner(pool.spawner())),
        );

        queue.enqueue(key("cmi.core.lesson_status"), "completed");
        queue.enqueue(key("cmi.core.score.raw"), "85");
        pool.run_until_stalled();

        assert_eq!(sink.scores(), vec![0.85]);
        assert_eq!(sink.statuses(), vec!["completed".to_string()]);
    }
}
