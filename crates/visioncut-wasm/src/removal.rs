//! Promise-based background removal bridge.
//!
//! The segmentation model lives on the JavaScript side. It is handed to the
//! editor as a function
//!
//! ```typescript
//! (width: number, height: number, rgba: Uint8Array) =>
//!     Promise<{ width: number, height: number, pixels: Uint8Array | Uint8ClampedArray }>
//! ```
//!
//! An `ImageData` also works as the resolved value, since its `data` field is
//! accepted in place of `pixels`. The function may return the object directly
//! instead of a promise.

use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect, Uint8Array, Uint8ClampedArray};
use visioncut_core::{BackgroundRemover, ImageHandle, RemovalError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::errors::describe_js_error;

/// [`BackgroundRemover`] backed by a JavaScript callback.
pub(crate) struct JsBackgroundRemover {
    callback: Function,
}

impl JsBackgroundRemover {
    pub(crate) fn new(callback: Function) -> Self {
        Self { callback }
    }
}

#[async_trait(?Send)]
impl BackgroundRemover for JsBackgroundRemover {
    async fn remove_background(&self, image: &ImageHandle) -> Result<ImageHandle, RemovalError> {
        let (width, height) = image.natural_size();
        let rgba = Uint8Array::from(image.raster().as_raw().as_slice());

        let returned = self
            .callback
            .call3(
                &JsValue::NULL,
                &JsValue::from(width),
                &JsValue::from(height),
                &rgba,
            )
            .map_err(js_failure)?;
        let resolved = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(js_failure)?;

        let (out_width, out_height, pixels) = read_output(&resolved)?;
        let handle =
            ImageHandle::from_rgba(out_width, out_height, pixels, image.displayed_size())?;
        Ok(handle)
    }
}

fn js_failure(value: JsValue) -> RemovalError {
    RemovalError::Failed(describe_js_error(&value))
}

fn read_output(value: &JsValue) -> Result<(u32, u32, Vec<u8>), RemovalError> {
    if !value.is_object() {
        return Err(RemovalError::Failed(
            "Background removal resolved to a non-object".to_string(),
        ));
    }
    let width = read_dimension(value, "width")?;
    let height = read_dimension(value, "height")?;

    let mut pixels = get(value, "pixels")?;
    if pixels.is_undefined() {
        pixels = get(value, "data")?;
    }
    let pixels = if let Some(array) = pixels.dyn_ref::<Uint8Array>() {
        array.to_vec()
    } else if let Some(array) = pixels.dyn_ref::<Uint8ClampedArray>() {
        array.to_vec()
    } else {
        return Err(RemovalError::Failed(
            "Background removal result has no pixel array".to_string(),
        ));
    };

    Ok((width, height, pixels))
}

fn get(value: &JsValue, key: &str) -> Result<JsValue, RemovalError> {
    Reflect::get(value, &JsValue::from_str(key)).map_err(js_failure)
}

fn read_dimension(value: &JsValue, key: &str) -> Result<u32, RemovalError> {
    let n = get(value, key)?.as_f64().unwrap_or(f64::NAN);
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
        return Err(RemovalError::Failed(format!(
            "Background removal result has invalid {}",
            key
        )));
    }
    Ok(n as u32)
}
