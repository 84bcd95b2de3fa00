//! Synchronous SCORM runtime facade over the resolver and write queue.

use std::cell::Cell;
use std::rc::Rc;

use scorm_runtime_contract::{
    DataKey, ScormVersion, API_TRUE, NO_ERROR_CODE, STUB_DIAGNOSTIC, STUB_ERROR_STRING,
};

use crate::display::FullscreenPresenter;
use crate::queue::WriteQueue;
use crate::resolver::ReadResolver;

/// One-shot fullscreen trigger state for the "present on first interaction"
/// policy. Re-arms when content writes an exit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FullscreenTrigger {
    NotYetTriggered,
    Triggered,
}

/// The synchronous data-access API handed to embedded content.
///
/// Both historical variants share this one implementation; only the method
/// names and the global binding differ, and those belong to the installer.
/// Lifecycle and diagnostic methods return constant answers because the
/// bridge holds no multi-step session state: it is always ready, and the
/// error side channel is a stub by design.
pub struct RuntimeApi {
    version: ScormVersion,
    resolver: ReadResolver,
    queue: WriteQueue,
    fullscreen: Rc<dyn FullscreenPresenter>,
    fullscreen_on_first_write: bool,
    trigger: Cell<FullscreenTrigger>,
}

impl RuntimeApi {
    /// Builds the facade for one session.
    pub fn new(
        version: ScormVersion,
        resolver: ReadResolver,
        queue: WriteQueue,
        fullscreen: Rc<dyn FullscreenPresenter>,
        fullscreen_on_first_write: bool,
    ) -> Self {
        Self {
            version,
            resolver,
            queue,
            fullscreen,
            fullscreen_on_first_write,
            trigger: Cell::new(FullscreenTrigger::NotYetTriggered),
        }
    }

    /// Variant this facade was constructed for.
    pub fn version(&self) -> ScormVersion {
        self.version
    }

    /// `LMSInitialize` / `Initialize`.
    pub fn initialize(&self) -> &'static str {
        API_TRUE
    }

    /// `LMSFinish` / `Terminate`.
    pub fn terminate(&self) -> &'static str {
        API_TRUE
    }

    /// `LMSGetValue` / `GetValue`: resolves through cache or round-trip.
    pub fn get_value(&self, key: &DataKey) -> String {
        self.resolver.read(key)
    }

    /// `LMSSetValue` / `SetValue`: enqueues the write and answers instantly.
    pub fn set_value(&self, key: DataKey, value: impl Into<String>) -> &'static str {
        if key.is_exit_key() {
            self.fullscreen.exit();
            self.trigger.set(FullscreenTrigger::NotYetTriggered);
        } else if self.fullscreen_on_first_write
            && self.trigger.get() == FullscreenTrigger::NotYetTriggered
        {
            self.fullscreen.enter();
            self.trigger.set(FullscreenTrigger::Triggered);
        }
        self.queue.enqueue(key, value);
        API_TRUE
    }

    /// `LMSCommit` / `Commit`: a no-op; the queue flushes continuously.
    pub fn commit(&self) -> &'static str {
        API_TRUE
    }

    /// `LMSGetLastError` / `GetLastError`.
    pub fn get_last_error(&self) -> &'static str {
        NO_ERROR_CODE
    }

    /// `LMSGetErrorString` / `GetErrorString`.
    pub fn get_error_string(&self, _error_code: &str) -> &'static str {
        STUB_ERROR_STRING
    }

    /// `LMSGetDiagnostic` / `GetDiagnostic`.
    pub fn get_diagnostic(&self, _error_code: &str) -> &'static str {
        STUB_DIAGNOSTIC
    }
}
