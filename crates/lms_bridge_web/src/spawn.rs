//! Browser task spawning for the write-queue consumer loop.

use lms_bridge::queue::{QueueTask, TaskSpawner};

/// [`TaskSpawner`] over `wasm_bindgen_futures::spawn_local`, the browser's
/// single-threaded cooperative executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnLocalTasks;

impl TaskSpawner for SpawnLocalTasks {
    fn spawn_task(&self, task: QueueTask) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
