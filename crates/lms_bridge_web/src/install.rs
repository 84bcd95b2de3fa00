//! Global API object construction, installation, and popup mirroring.

use std::any::Any;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use lms_bridge::RuntimeApi;
use scorm_runtime_contract::{BridgeError, DataKey, ScormVersion};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;

/// The installed runtime API object for one session.
///
/// Holds the JS object bound under the variant's mandated global name and
/// keeps the backing closures alive for the session; dropping this tears the
/// bindings' implementations down, so hosts keep it for the page lifetime.
/// Mirroring binds the *same* object into further windows, so content in a
/// popup talks to the same queue and cache.
pub struct InstalledApi {
    version: ScormVersion,
    object: Object,
    _closures: Vec<Box<dyn Any>>,
}

impl InstalledApi {
    /// Variant whose naming the installed object carries.
    pub fn version(&self) -> ScormVersion {
        self.version
    }

    /// The shared JS API object.
    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Binds the API object under the variant's global name on `target`
    /// (a `window`-like object).
    pub fn install_into(&self, target: &JsValue) -> Result<(), BridgeError> {
        Reflect::set(
            target,
            &JsValue::from_str(self.version.global_binding_name()),
            &self.object,
        )
        .map_err(|err| BridgeError::InstallFailed {
            detail: format!("{err:?}"),
        })?;
        Ok(())
    }
}

fn set_method(
    object: &Object,
    name: &str,
    function: &JsValue,
) -> Result<(), BridgeError> {
    Reflect::set(object, &JsValue::from_str(name), function).map_err(|err| {
        BridgeError::InstallFailed {
            detail: format!("defining {name}: {err:?}"),
        }
    })?;
    Ok(())
}

/// Coerces a content-supplied call argument to SCORM's stringly data model.
fn js_arg_to_string(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if value.is_null() || value.is_undefined() {
        return String::new();
    }
    if let Some(number) = value.as_f64() {
        // Integral numbers print without a trailing `.0`.
        if number.fract() == 0.0 && number.abs() < 9e15 {
            return (number as i64).to_string();
        }
        return number.to_string();
    }
    if let Some(flag) = value.as_bool() {
        return flag.to_string();
    }
    String::new()
}

/// Builds the variant-named JS API object over a shared facade and installs
/// it on the current window.
///
/// Exactly one of the two specification-mandated globals is populated,
/// selected by the facade's version.
pub fn install_runtime_api(api: Rc<RuntimeApi>) -> Result<InstalledApi, BridgeError> {
    let installed = build_api_object(api)?;
    let window = web_sys::window().ok_or(BridgeError::HostUnavailable {
        capability: "window",
    })?;
    installed.install_into(window.as_ref())?;
    Ok(installed)
}

/// Builds the API object without binding it anywhere; hosts embedding
/// content in a frame they control can install it themselves.
pub fn build_api_object(api: Rc<RuntimeApi>) -> Result<InstalledApi, BridgeError> {
    let version = api.version();
    let names = version.method_names();
    let object = Object::new();
    let mut closures: Vec<Box<dyn Any>> = Vec::new();

    {
        let api = api.clone();
        let initialize = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |_arg: JsValue| {
            JsValue::from_str(api.initialize())
        });
        set_method(&object, names.initialize, initialize.as_ref())?;
        closures.push(Box::new(initialize));
    }
    {
        let api = api.clone();
        let terminate = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |_arg: JsValue| {
            JsValue::from_str(api.terminate())
        });
        set_method(&object, names.terminate, terminate.as_ref())?;
        closures.push(Box::new(terminate));
    }
    {
        let api = api.clone();
        let get_value = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |key: JsValue| {
            let key = DataKey::new(js_arg_to_string(&key));
            JsValue::from_str(&api.get_value(&key))
        });
        set_method(&object, names.get_value, get_value.as_ref())?;
        closures.push(Box::new(get_value));
    }
    {
        let api = api.clone();
        let set_value =
            Closure::<dyn Fn(JsValue, JsValue) -> JsValue>::new(move |key: JsValue, value: JsValue| {
                let key = DataKey::new(js_arg_to_string(&key));
                JsValue::from_str(api.set_value(key, js_arg_to_string(&value)))
            });
        set_method(&object, names.set_value, set_value.as_ref())?;
        closures.push(Box::new(set_value));
    }
    {
        let api = api.clone();
        let commit = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |_arg: JsValue| {
            JsValue::from_str(api.commit())
        });
        set_method(&object, names.commit, commit.as_ref())?;
        closures.push(Box::new(commit));
    }
    {
        let api = api.clone();
        let get_last_error = Closure::<dyn Fn() -> JsValue>::new(move || {
            JsValue::from_str(api.get_last_error())
        });
        set_method(&object, names.get_last_error, get_last_error.as_ref())?;
        closures.push(Box::new(get_last_error));
    }
    {
        let api = api.clone();
        let get_error_string = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |code: JsValue| {
            JsValue::from_str(api.get_error_string(&js_arg_to_string(&code)))
        });
        set_method(&object, names.get_error_string, get_error_string.as_ref())?;
        closures.push(Box::new(get_error_string));
    }
    {
        let get_diagnostic = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |code: JsValue| {
            JsValue::from_str(api.get_diagnostic(&js_arg_to_string(&code)))
        });
        set_method(&object, names.get_diagnostic, get_diagnostic.as_ref())?;
        closures.push(Box::new(get_diagnostic));
    }

    Ok(InstalledApi {
        version,
        object,
        _closures: closures,
    })
}
