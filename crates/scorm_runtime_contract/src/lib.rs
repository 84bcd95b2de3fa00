//! Shared SCORM runtime contracts used by the bridge core and browser adapters.
//!
//! This crate is intentionally runtime-agnostic. It defines the two historical
//! SCORM API variants (method-name tables and mandated global binding names),
//! the stubbed lifecycle answers the runtime returns, the data-key/value wire
//! shapes exchanged with the LMS, and the bootstrap configuration, without
//! depending on browser APIs or bridge internals.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Boolean-true answer mandated by the SCORM runtime contract.
pub const API_TRUE: &str = "true";
/// Boolean-false answer mandated by the SCORM runtime contract.
pub const API_FALSE: &str = "false";
/// "No error" code returned by the stubbed error channel.
pub const NO_ERROR_CODE: &str = "0";
/// Placeholder error string returned by the stubbed error channel.
pub const STUB_ERROR_STRING: &str = "Some Error";
/// Placeholder diagnostic string returned by the stubbed error channel.
pub const STUB_DIAGNOSTIC: &str = "Some Diagnostic";

/// Settings token selecting the SCORM 1.2 variant.
pub const SCORM_12_TOKEN: &str = "SCORM_12";
/// Settings token selecting the SCORM 2004 variant.
pub const SCORM_2004_TOKEN: &str = "SCORM_2004";

/// Data keys whose authoritative value is computed server-side by grading
/// logic and must always be re-fetched rather than answered from cache.
pub const DEFAULT_UNCACHED_KEYS: &[&str] = &[
    "cmi.core.lesson_status",
    "cmi.completion_status",
    "cmi.success_status",
    "cmi.core.score.raw",
    "cmi.score.raw",
];

/// Dot-delimited identifier for one field of recorded learner state.
///
/// Keys are opaque to the bridge; only membership in the uncached allow-list
/// and the exit keys receive special treatment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataKey(String);

impl DataKey {
    /// Creates a data key from content-supplied input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this key signals session exit in either variant
    /// (`cmi.core.exit` for 1.2, `cmi.exit` for 2004).
    pub fn is_exit_key(&self) -> bool {
        self.0 == "cmi.core.exit" || self.0 == "cmi.exit"
    }
}

impl std::fmt::Display for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// The eight runtime method names one SCORM API variant exposes to content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeMethodNames {
    /// Session start handshake.
    pub initialize: &'static str,
    /// Session end handshake (`LMSFinish` in 1.2, `Terminate` in 2004).
    pub terminate: &'static str,
    /// Read one data key.
    pub get_value: &'static str,
    /// Write one data key.
    pub set_value: &'static str,
    /// Flush request (a no-op for this bridge; writes flush continuously).
    pub commit: &'static str,
    /// Last error code query.
    pub get_last_error: &'static str,
    /// Error string lookup.
    pub get_error_string: &'static str,
    /// Diagnostic string lookup.
    pub get_diagnostic: &'static str,
}

const SCORM_12_METHODS: RuntimeMethodNames = RuntimeMethodNames {
    initialize: "LMSInitialize",
    terminate: "LMSFinish",
    get_value: "LMSGetValue",
    set_value: "LMSSetValue",
    commit: "LMSCommit",
    get_last_error: "LMSGetLastError",
    get_error_string: "LMSGetErrorString",
    get_diagnostic: "LMSGetDiagnostic",
};

const SCORM_2004_METHODS: RuntimeMethodNames = RuntimeMethodNames {
    initialize: "Initialize",
    terminate: "Terminate",
    get_value: "GetValue",
    set_value: "SetValue",
    commit: "Commit",
    get_last_error: "GetLastError",
    get_error_string: "GetErrorString",
    get_diagnostic: "GetDiagnostic",
};

/// Historical SCORM API variant selected once at session bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScormVersion {
    /// SCORM 1.2 (`LMS`-prefixed method names, global binding `API`).
    #[default]
    Scorm12,
    /// SCORM 2004 (unprefixed method names, global binding `API_1484_11`).
    Scorm2004,
}

impl ScormVersion {
    /// Resolves a variant from the legacy settings token.
    ///
    /// Only `SCORM_12` selects the 1.2 variant; any other token selects 2004,
    /// matching the tolerance of the original runtime shim.
    pub fn from_settings_token(token: &str) -> Self {
        if token == SCORM_12_TOKEN {
            Self::Scorm12
        } else {
            Self::Scorm2004
        }
    }

    /// Returns the global object name content discovers this variant at.
    pub const fn global_binding_name(self) -> &'static str {
        match self {
            Self::Scorm12 => "API",
            Self::Scorm2004 => "API_1484_11",
        }
    }

    /// Returns the variant's runtime method-name table.
    pub const fn method_names(self) -> &'static RuntimeMethodNames {
        match self {
            Self::Scorm12 => &SCORM_12_METHODS,
            Self::Scorm2004 => &SCORM_2004_METHODS,
        }
    }

    /// Returns the legacy settings token for this variant.
    pub const fn settings_token(self) -> &'static str {
        match self {
            Self::Scorm12 => SCORM_12_TOKEN,
            Self::Scorm2004 => SCORM_2004_TOKEN,
        }
    }
}

/// One pending write in enqueue order, serialized with the wire field names
/// the LMS set-values handler expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWrite {
    /// Data key being written.
    #[serde(rename = "name")]
    pub key: DataKey,
    /// Opaque value payload.
    pub value: String,
}

impl PendingWrite {
    /// Creates a pending write.
    pub fn new(key: impl Into<DataKey>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Per-write result returned by the LMS, positionally aligned to the batch.
///
/// Both fields are optional; the server only reports them when the write
/// affected a graded or completion-tracked field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WriteResult {
    /// Updated completion/success label, when the write changed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_status: Option<String>,
    /// Updated lesson score, when the server recomputed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_score: Option<f64>,
}

/// Bootstrap configuration recognized by the bridge, parsed from
/// host-supplied settings JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Legacy version token (`SCORM_12` / `SCORM_2004`).
    pub scorm_version: String,
    /// Present content fullscreen on the first recorded interaction.
    pub fullscreen_on_first_write: bool,
    /// Content runs in a popup window mirrored from the host page.
    pub popup_mode: bool,
    /// Optional override of the always-authoritative key set.
    pub uncached_keys: Option<Vec<String>>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scorm_version: SCORM_12_TOKEN.to_string(),
            fullscreen_on_first_write: false,
            popup_mode: false,
            uncached_keys: None,
        }
    }
}

impl BridgeConfig {
    /// Resolves the configured API variant.
    pub fn version(&self) -> ScormVersion {
        ScormVersion::from_settings_token(&self.scorm_version)
    }
}

/// Coerces a scalar JSON value to the string form handed to content.
///
/// The LMS answers numbers for score fields and strings elsewhere; the SCORM
/// data model is stringly typed, so scalars are rendered and `null`/absent
/// becomes the empty string.
pub fn json_scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Typed failure raised while constructing or wiring a bridge session.
///
/// Runtime read/write failures are absorbed by design and never surface
/// through this type; it covers the bootstrap path only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Host-supplied settings could not be parsed.
    InvalidSettings {
        /// Parser failure detail.
        detail: String,
    },
    /// The host environment lacks a required capability (window, DOM root).
    HostUnavailable {
        /// Stable capability identifier used in diagnostics.
        capability: &'static str,
    },
    /// Installing the global API binding failed.
    InstallFailed {
        /// Interop failure detail.
        detail: String,
    },
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSettings { detail } => write!(f, "invalid bridge settings: {detail}"),
            Self::HostUnavailable { capability } => {
                write!(f, "host capability unavailable: {capability}")
            }
            Self::InstallFailed { detail } => write!(f, "api install failed: {detail}"),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Initial snapshot of known values, keyed by data-key text.
pub type SnapshotMap = HashMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_token_resolution_matches_legacy_tolerance() {
        assert_eq!(
            ScormVersion::from_settings_token("SCORM_12"),
            ScormVersion::Scorm12
        );
        assert_eq!(
            ScormVersion::from_settings_token("SCORM_2004"),
            ScormVersion::Scorm2004
        );
        // Unknown tokens fall through to the 2004 variant.
        assert_eq!(
            ScormVersion::from_settings_token("scorm_12"),
            ScormVersion::Scorm2004
        );
    }

    #[test]
    fn exactly_one_global_binding_per_variant() {
        assert_eq!(ScormVersion::Scorm12.global_binding_name(), "API");
        assert_eq!(ScormVersion::Scorm2004.global_binding_name(), "API_1484_11");
    }

    #[test]
    fn method_tables_differ_only_in_naming() {
        let v12 = ScormVersion::Scorm12.method_names();
        let v2004 = ScormVersion::Scorm2004.method_names();
        assert_eq!(v12.initialize, "LMSInitialize");
        assert_eq!(v12.terminate, "LMSFinish");
        assert_eq!(v2004.initialize, "Initialize");
        assert_eq!(v2004.terminate, "Terminate");
        assert_eq!(v12.set_value, "LMSSetValue");
        assert_eq!(v2004.set_value, "SetValue");
    }

    #[test]
    fn exit_keys_cover_both_variants() {
        assert!(DataKey::new("cmi.core.exit").is_exit_key());
        assert!(DataKey::new("cmi.exit").is_exit_key());
        assert!(!DataKey::new("cmi.suspend_data").is_exit_key());
    }

    #[test]
    fn pending_write_serializes_with_wire_field_names() {
        let write = PendingWrite::new("cmi.suspend_data", "xyz");
        let value = serde_json::to_value(&write).expect("serialize write");
        assert_eq!(
            value,
            serde_json::json!({"name": "cmi.suspend_data", "value": "xyz"})
        );
    }

    #[test]
    fn write_result_tolerates_sparse_server_payloads() {
        let result: WriteResult = serde_json::from_str("{}").expect("empty result");
        assert_eq!(result, WriteResult::default());

        let result: WriteResult =
            serde_json::from_str(r#"{"completion_status": "completed", "lesson_score": 0.8}"#)
                .expect("full result");
        assert_eq!(result.completion_status.as_deref(), Some("completed"));
        assert_eq!(result.lesson_score, Some(0.8));
    }

    #[test]
    fn bridge_config_defaults_and_overrides() {
        let config: BridgeConfig = serde_json::from_str("{}").expect("default config");
        assert_eq!(config.version(), ScormVersion::Scorm12);
        assert!(!config.fullscreen_on_first_write);
        assert!(!config.popup_mode);
        assert_eq!(config.uncached_keys, None);

        let config: BridgeConfig = serde_json::from_str(
            r#"{
                "scorm_version": "SCORM_2004",
                "fullscreen_on_first_write": true,
                "uncached_keys": ["cmi.score.raw"]
            }"#,
        )
        .expect("override config");
        assert_eq!(config.version(), ScormVersion::Scorm2004);
        assert!(config.fullscreen_on_first_write);
        assert_eq!(
            config.uncached_keys,
            Some(vec!["cmi.score.raw".to_string()])
        );
    }

    #[test]
    fn json_scalars_render_as_content_strings() {
        use serde_json::json;
        assert_eq!(json_scalar_to_string(&json!("abc")), "abc");
        assert_eq!(json_scalar_to_string(&json!(80)), "80");
        assert_eq!(json_scalar_to_string(&json!(0.5)), "0.5");
        assert_eq!(json_scalar_to_string(&json!(null)), "");
    }
}
