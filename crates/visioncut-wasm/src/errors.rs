//! Conversions between Rust errors and JS values.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Error value handed back to JS: the error's message as a string.
pub(crate) fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Best-effort text for a thrown JS value.
pub(crate) fn describe_js_error(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", value)
}
