//! DOM-backed status widgets and fullscreen presentation.

use lms_bridge::display::{FullscreenPresenter, StatusSink};
use web_sys::Element;

/// Class toggled on the block root while content is presented fullscreen.
pub const FULLSCREEN_CLASS: &str = "full-screen-scorm";

const LESSON_SCORE_SELECTOR: &str = ".lesson_score";
const COMPLETION_STATUS_SELECTOR: &str = ".completion_status";

/// Status sink writing score and completion labels into the block's
/// `.lesson_score` / `.completion_status` children.
///
/// Updates are best-effort: widgets the host page did not render are
/// silently skipped, matching the legacy block markup contract.
#[derive(Debug, Clone)]
pub struct DomStatusSink {
    root: Element,
}

impl DomStatusSink {
    /// Builds a sink over the block root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    fn set_widget_text(&self, selector: &str, text: &str) {
        if let Ok(Some(widget)) = self.root.query_selector(selector) {
            widget.set_text_content(Some(text));
        }
    }
}

impl StatusSink for DomStatusSink {
    fn lesson_score_changed(&self, lesson_score: f64) {
        self.set_widget_text(LESSON_SCORE_SELECTOR, &format_lesson_score(lesson_score));
    }

    fn completion_status_changed(&self, status: &str) {
        self.set_widget_text(COMPLETION_STATUS_SELECTOR, status);
    }
}

/// Renders a lesson score the way the legacy block displayed it: whole
/// numbers without a trailing `.0`, fractional scores as the raw number.
pub fn format_lesson_score(lesson_score: f64) -> String {
    if lesson_score.fract() == 0.0 {
        format!("{lesson_score:.0}")
    } else {
        format!("{lesson_score}")
    }
}

/// Fullscreen presenter toggling [`FULLSCREEN_CLASS`] on the block root.
#[derive(Debug, Clone)]
pub struct DomFullscreenPresenter {
    root: Element,
}

impl DomFullscreenPresenter {
    /// Builds a presenter over the block root element.
    pub fn new(root: Element) -> Self {
        Self { root }
    }
}

impl FullscreenPresenter for DomFullscreenPresenter {
    fn enter(&self) {
        let _ = self.root.class_list().add_1(FULLSCREEN_CLASS);
    }

    fn exit(&self) {
        let _ = self.root.class_list().remove_1(FULLSCREEN_CLASS);
    }
}
