//! Browser (`wasm32`) wiring for the SCORM runtime bridge.
//!
//! This crate supplies the concrete collaborators the bridge core leaves
//! abstract: HTTP transport to the LMS handlers, the global API object with
//! variant method naming, DOM status widgets, the fullscreen class toggle,
//! and `spawn_local` task scheduling. Pure pieces compile and test natively;
//! interop paths report themselves unsupported off `wasm32`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::cell::RefCell;
use std::rc::Rc;

use lms_bridge::{bootstrap_session, SessionBridge};
use scorm_runtime_contract::{BridgeConfig, BridgeError};
use wasm_bindgen::JsValue;

pub mod display;
pub mod install;
mod logging;
pub mod spawn;
pub mod transport;

pub use display::{DomFullscreenPresenter, DomStatusSink, FULLSCREEN_CLASS};
pub use install::{build_api_object, install_runtime_api, InstalledApi};
pub use spawn::SpawnLocalTasks;
pub use transport::{HttpLmsService, LmsEndpoints};

/// One fully wired browser session: the bridge plus its installed API.
pub struct BrowserSession {
    /// Bootstrapped bridge (shared facade, version, seed status).
    pub bridge: SessionBridge,
    /// Installed global API object and its live closures.
    pub installed: InstalledApi,
    /// Parsed bootstrap configuration.
    pub config: BridgeConfig,
}

thread_local! {
    static ACTIVE_SESSION: RefCell<Option<Rc<BrowserSession>>> = const { RefCell::new(None) };
}

/// Parses host-supplied settings JSON into a [`BridgeConfig`].
///
/// # Errors
///
/// Returns [`BridgeError::InvalidSettings`] when the payload does not match
/// the recognized configuration shape.
pub fn parse_settings(settings: JsValue) -> Result<BridgeConfig, BridgeError> {
    serde_wasm_bindgen::from_value(settings).map_err(|err| BridgeError::InvalidSettings {
        detail: err.to_string(),
    })
}

/// Bootstraps the bridge for one block and installs the selected API variant
/// on the current window.
///
/// When `popup_mode` is configured the host must pass the content window it
/// opened as `popup_window`; the same API object is mirrored there so popup
/// content reaches the same bridge instance. Without the flag, a supplied
/// window is ignored.
///
/// The session is retained process-wide so content loaded later (including a
/// popup the host mirrors into) keeps talking to the same bridge instance.
/// A seed-snapshot failure is logged and the session starts over an empty
/// cache rather than aborting.
///
/// # Errors
///
/// Returns an error when settings cannot be parsed, the global binding
/// cannot be installed, or `popup_mode` is set without a popup window;
/// runtime read/write failures are absorbed later by design.
pub fn start_session(
    settings: JsValue,
    block_root: web_sys::Element,
    endpoints: LmsEndpoints,
    popup_window: Option<&JsValue>,
) -> Result<Rc<BrowserSession>, BridgeError> {
    let config = parse_settings(settings)?;

    let bridge = bootstrap_session(
        &config,
        Rc::new(HttpLmsService::new(endpoints)),
        Rc::new(DomStatusSink::new(block_root.clone())),
        Rc::new(DomFullscreenPresenter::new(block_root)),
        Rc::new(SpawnLocalTasks),
    );
    if let Some(detail) = &bridge.seed_error {
        logging::warn(&format!(
            "starting session over an empty cache; snapshot fetch failed: {detail}"
        ));
    }

    let installed = install_runtime_api(bridge.api.clone())?;
    if let Some(target) = popup_target(&config, popup_window)? {
        installed.install_into(target)?;
    }
    let session = Rc::new(BrowserSession {
        bridge,
        installed,
        config,
    });
    ACTIVE_SESSION.with(|active| {
        *active.borrow_mut() = Some(session.clone());
    });
    Ok(session)
}

/// Resolves where the popup mirror must be installed, if anywhere.
///
/// `popup_mode` content lives in a window the host opened and can only reach
/// the bridge through a mirrored binding, so a missing window is a bootstrap
/// failure rather than something to limp past.
fn popup_target<'a>(
    config: &BridgeConfig,
    popup_window: Option<&'a JsValue>,
) -> Result<Option<&'a JsValue>, BridgeError> {
    if !config.popup_mode {
        return Ok(None);
    }
    match popup_window {
        Some(target) => Ok(Some(target)),
        None => Err(BridgeError::HostUnavailable {
            capability: "popup-window",
        }),
    }
}

/// Returns the active session, if one has been started on this page.
pub fn active_session() -> Option<Rc<BrowserSession>> {
    ACTIVE_SESSION.with(|active| active.borrow().clone())
}

/// Mirrors the active session's API object into `target` (a popup window),
/// so content running there calls the same bridge instance.
///
/// # Errors
///
/// Returns [`BridgeError::HostUnavailable`] when no session is active, or an
/// install error when the binding cannot be written on `target`.
pub fn mirror_active_session_into(target: &JsValue) -> Result<(), BridgeError> {
    let session = active_session().ok_or(BridgeError::HostUnavailable {
        capability: "active-session",
    })?;
    session.installed.install_into(target)
}

/// Ends the active session, dropping the bridge and its closures.
///
/// The global binding itself is left on any windows it was installed into;
/// tearing those down belongs to the host page unloading them.
pub fn end_session() {
    ACTIVE_SESSION.with(|active| {
        *active.borrow_mut() = None;
    });
}
