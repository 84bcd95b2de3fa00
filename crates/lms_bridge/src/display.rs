//! On-page status and fullscreen collaborator contracts.

use std::{cell::RefCell, rc::Rc};

/// Receives UI-relevant fields extracted from write-batch results.
///
/// Implementations must not fail; the bridge forwards updates best-effort and
/// has no channel for reporting presentation errors back to content.
pub trait StatusSink {
    /// The server recomputed the lesson score.
    fn lesson_score_changed(&self, lesson_score: f64);

    /// The completion/success label changed.
    fn completion_status_changed(&self, status: &str);
}

#[derive(Debug, Clone, Copy, Default)]
/// Status sink that drops all updates; used when no widgets are mounted.
pub struct NoopStatusSink;

impl StatusSink for NoopStatusSink {
    fn lesson_score_changed(&self, _lesson_score: f64) {}

    fn completion_status_changed(&self, _status: &str) {}
}

/// Recording sink capturing forwarded updates in arrival order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatusSink {
    scores: Rc<RefCell<Vec<f64>>>,
    statuses: Rc<RefCell<Vec<String>>>,
}

impl MemoryStatusSink {
    /// Returns forwarded scores in arrival order.
    pub fn scores(&self) -> Vec<f64> {
        self.scores.borrow().clone()
    }

    /// Returns forwarded completion labels in arrival order.
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.borrow().clone()
    }
}

impl StatusSink for MemoryStatusSink {
    fn lesson_score_changed(&self, lesson_score: f64) {
        self.scores.borrow_mut().push(lesson_score);
    }

    fn completion_status_changed(&self, status: &str) {
        self.statuses.borrow_mut().push(status.to_string());
    }
}

/// Presents or dismisses the content fullscreen treatment.
pub trait FullscreenPresenter {
    /// Enters the fullscreen presentation.
    fn enter(&self);

    /// Leaves the fullscreen presentation.
    fn exit(&self);
}

#[derive(Debug, Clone, Copy, Default)]
/// Presenter that ignores fullscreen transitions.
pub struct NoopFullscreenPresenter;

impl FullscreenPresenter for NoopFullscreenPresenter {
    fn enter(&self) {}

    fn exit(&self) {}
}

/// Recording presenter tracking the current fullscreen state for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryFullscreenPresenter {
    active: Rc<RefCell<bool>>,
    transitions: Rc<RefCell<Vec<bool>>>,
}

impl MemoryFullscreenPresenter {
    /// Returns whether fullscreen is currently presented.
    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Returns enter/exit transitions in arrival order (`true` = enter).
    pub fn transitions(&self) -> Vec<bool> {
        self.transitions.borrow().clone()
    }
}

impl FullscreenPresenter for MemoryFullscreenPresenter {
    fn enter(&self) {
        *self.active.borrow_mut() = true;
        self.transitions.borrow_mut().push(true);
    }

    fn exit(&self) {
        *self.active.borrow_mut() = false;
        self.transitions.borrow_mut().push(false);
    }
}
