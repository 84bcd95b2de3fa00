//! Browser HTTP transport for the LMS persistence service.
//!
//! Reads and the seed snapshot use a synchronous `XMLHttpRequest` round-trip
//! because the legacy runtime contract blocks the caller; write batches go
//! through `fetch` and are the bridge's only true suspension point.

use std::collections::HashMap;

use lms_bridge::service::{LmsService, LmsServiceFuture};
use scorm_runtime_contract::{
    json_scalar_to_string, DataKey, PendingWrite, SnapshotMap, WriteResult,
};
use serde_json::Value;

use crate::logging;

/// Resolved handler URLs for one block instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmsEndpoints {
    /// Single-key blocking read handler.
    pub get_value_url: String,
    /// Ordered write-batch handler.
    pub set_values_url: String,
    /// Initial snapshot handler, consumed once at bootstrap.
    pub snapshot_url: String,
}

impl LmsEndpoints {
    /// Builds endpoint URLs from explicit handler locations.
    pub fn new(
        get_value_url: impl Into<String>,
        set_values_url: impl Into<String>,
        snapshot_url: impl Into<String>,
    ) -> Self {
        Self {
            get_value_url: get_value_url.into(),
            set_values_url: set_values_url.into(),
            snapshot_url: snapshot_url.into(),
        }
    }

    /// Builds the conventional handler URLs under one block handler base.
    pub fn for_handler_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            get_value_url: format!("{base}/scorm_get_value"),
            set_values_url: format!("{base}/scorm_set_values"),
            snapshot_url: format!("{base}/scorm_snapshot"),
        }
    }
}

/// [`LmsService`] adapter over the block's HTTP handlers.
#[derive(Debug, Clone)]
pub struct HttpLmsService {
    endpoints: LmsEndpoints,
}

impl HttpLmsService {
    /// Builds the transport for one block instance.
    pub fn new(endpoints: LmsEndpoints) -> Self {
        Self { endpoints }
    }
}

impl LmsService for HttpLmsService {
    fn get_value(&self, key: &DataKey) -> Result<String, String> {
        let body = serde_json::json!({ "name": key.as_str() }).to_string();
        let text = imp::post_blocking(&self.endpoints.get_value_url, &body)?;
        let payload: Value =
            serde_json::from_str(&text).map_err(|e| format!("malformed get-value reply: {e}"))?;
        let value = payload
            .get("value")
            .ok_or_else(|| "get-value reply missing `value`".to_string())?;
        Ok(json_scalar_to_string(value))
    }

    fn set_values<'a>(
        &'a self,
        batch: &'a [PendingWrite],
    ) -> LmsServiceFuture<'a, Result<Vec<WriteResult>, String>> {
        Box::pin(async move {
            let body = serde_json::to_string(batch)
                .map_err(|e| format!("serialize write batch: {e}"))?;
            let outcome = imp::post_fetch(&self.endpoints.set_values_url, &body).await;
            let text = match outcome {
                Ok(text) => text,
                Err(detail) => {
                    logging::warn(&format!(
                        "discarding write batch of {}: {detail}",
                        batch.len()
                    ));
                    return Err(detail);
                }
            };
            serde_json::from_str(&text).map_err(|e| {
                let detail = format!("malformed set-values reply: {e}");
                logging::warn(&detail);
                detail
            })
        })
    }

    fn initial_snapshot(&self) -> Result<SnapshotMap, String> {
        let text = imp::get_blocking(&self.endpoints.snapshot_url)?;
        let raw: HashMap<String, Value> =
            serde_json::from_str(&text).map_err(|e| format!("malformed snapshot reply: {e}"))?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| (key, json_scalar_to_string(&value)))
            .collect())
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, Response, XmlHttpRequest};

    fn js_error_to_string(err: JsValue) -> String {
        if let Some(text) = err.as_string() {
            return text;
        }
        if let Ok(message) = js_sys::Reflect::get(&err, &JsValue::from_str("message")) {
            if let Some(text) = message.as_string() {
                return text;
            }
        }
        format!("{err:?}")
    }

    fn send_blocking(method: &str, url: &str, body: Option<&str>) -> Result<String, String> {
        let xhr = XmlHttpRequest::new().map_err(js_error_to_string)?;
        xhr.open_with_async(method, url, false)
            .map_err(js_error_to_string)?;
        if body.is_some() {
            xhr.set_request_header("Content-Type", "application/json")
                .map_err(js_error_to_string)?;
        }
        xhr.send_with_opt_str(body).map_err(js_error_to_string)?;

        let status = xhr.status().map_err(js_error_to_string)?;
        if !(200..300).contains(&status) {
            return Err(format!("{method} {url} answered status {status}"));
        }
        Ok(xhr
            .response_text()
            .map_err(js_error_to_string)?
            .unwrap_or_default())
    }

    pub fn post_blocking(url: &str, body: &str) -> Result<String, String> {
        send_blocking("POST", url, Some(body))
    }

    pub fn get_blocking(url: &str) -> Result<String, String> {
        send_blocking("GET", url, None)
    }

    pub async fn post_fetch(url: &str, body: &str) -> Result<String, String> {
        let window = web_sys::window().ok_or_else(|| "no window".to_string())?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&JsValue::from_str(body));
        let request = Request::new_with_str_and_init(url, &init).map_err(js_error_to_string)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_error_to_string)?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error_to_string)?
            .dyn_into()
            .map_err(js_error_to_string)?;
        if !response.ok() {
            return Err(format!("POST {url} answered status {}", response.status()));
        }
        let text = JsFuture::from(response.text().map_err(js_error_to_string)?)
            .await
            .map_err(js_error_to_string)?;
        text.as_string()
            .ok_or_else(|| "set-values reply is not text".to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    fn unsupported() -> String {
        "browser LMS transport is only available when compiled for wasm32".to_string()
    }

    pub fn post_blocking(_url: &str, _body: &str) -> Result<String, String> {
        Err(unsupported())
    }

    pub fn get_blocking(_url: &str) -> Result<String, String> {
        Err(unsupported())
    }

    pub async fn post_fetch(_url: &str, _body: &str) -> Result<String, String> {
        Err(unsupported())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn handler_base_endpoints_follow_the_block_convention() {
        let endpoints = LmsEndpoints::for_handler_base("/xblock/handler/");
        assert_eq!(endpoints.get_value_url, "/xblock/handler/scorm_get_value");
        assert_eq!(endpoints.set_values_url, "/xblock/handler/scorm_set_values");
        assert_eq!(endpoints.snapshot_url, "/xblock/handler/scorm_snapshot");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_transport_reports_unsupported_instead_of_panicking() {
        let service = HttpLmsService::new(LmsEndpoints::for_handler_base("/h"));
        let err = service
            .get_value(&DataKey::new("cmi.suspend_data"))
            .expect_err("native round-trips are unsupported");
        assert!(err.contains("wasm32"));

        let err = futures::executor::block_on(
            service.set_values(&[PendingWrite::new("cmi.suspend_data", "x")]),
        )
        .expect_err("native fetch is unsupported");
        assert!(err.contains("wasm32"));
    }
}
