//! Console diagnostics for failures the bridge absorbs by design.

/// Emits a browser console warning; a no-op off `wasm32`.
pub(crate) fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}
