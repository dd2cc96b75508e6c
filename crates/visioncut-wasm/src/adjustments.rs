//! Adjustment WASM bindings.
//!
//! This module provides JavaScript bindings for the [`AdjustmentSet`] type and
//! the CSS strings the live preview is built from. Setters clamp to each
//! parameter's slider range.

use visioncut_core::{AdjustmentParam, AdjustmentSet, DisplaySize, FilterStack, PreviewStyle};
use wasm_bindgen::prelude::*;

/// Adjustment set wrapper for JavaScript
#[wasm_bindgen]
pub struct JsAdjustmentSet {
    inner: AdjustmentSet,
}

#[wasm_bindgen]
impl JsAdjustmentSet {
    /// Create a new adjustment set with default values
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: AdjustmentSet::new(),
        }
    }

    /// Get brightness (percent, 0 to 200)
    #[wasm_bindgen(getter)]
    pub fn brightness(&self) -> f32 {
        self.inner.brightness
    }

    /// Set brightness
    #[wasm_bindgen(setter)]
    pub fn set_brightness(&mut self, value: f32) {
        self.inner.set(AdjustmentParam::Brightness, value);
    }

    /// Get contrast (percent, 0 to 200)
    #[wasm_bindgen(getter)]
    pub fn contrast(&self) -> f32 {
        self.inner.contrast
    }

    /// Set contrast
    #[wasm_bindgen(setter)]
    pub fn set_contrast(&mut self, value: f32) {
        self.inner.set(AdjustmentParam::Contrast, value);
    }

    /// Get saturation (percent, 0 to 200)
    #[wasm_bindgen(getter)]
    pub fn saturation(&self) -> f32 {
        self.inner.saturation
    }

    /// Set saturation
    #[wasm_bindgen(setter)]
    pub fn set_saturation(&mut self, value: f32) {
        self.inner.set(AdjustmentParam::Saturation, value);
    }

    /// Get temperature (-100 cool to 100 warm)
    #[wasm_bindgen(getter)]
    pub fn temperature(&self) -> f32 {
        self.inner.temperature
    }

    /// Set temperature
    #[wasm_bindgen(setter)]
    pub fn set_temperature(&mut self, value: f32) {
        self.inner.set(AdjustmentParam::Temperature, value);
    }

    /// Get vignette intensity (0 to 200)
    #[wasm_bindgen(getter)]
    pub fn vignette(&self) -> f32 {
        self.inner.vignette
    }

    /// Set vignette intensity
    #[wasm_bindgen(setter)]
    pub fn set_vignette(&mut self, value: f32) {
        self.inner.set(AdjustmentParam::Vignette, value);
    }

    /// Check if all adjustments are at default values
    pub fn is_default(&self) -> bool {
        self.inner.is_default()
    }

    /// Restore every parameter to its default
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// CSS `filter` value for these adjustments
    pub fn filter_css(&self) -> String {
        FilterStack::compile(&self.inner).to_css()
    }

    /// Serialize to a plain JS object
    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Deserialize from a plain JS object. Missing fields take their
    /// defaults and out-of-range values are clamped.
    pub fn from_json(value: JsValue) -> Result<JsAdjustmentSet, JsValue> {
        let inner: AdjustmentSet =
            serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            inner: inner.clamped(),
        })
    }
}

impl Default for JsAdjustmentSet {
    fn default() -> Self {
        Self::new()
    }
}

impl JsAdjustmentSet {
    pub(crate) fn from_inner(inner: AdjustmentSet) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &AdjustmentSet {
        &self.inner
    }
}

/// Vignette overlay CSS for an image displayed at `width` x `height`.
///
/// Returns `undefined` when the intensity is zero.
///
/// # Example (TypeScript)
/// ```typescript
/// overlay.style.backgroundImage = vignette_css(adj.vignette, img.clientWidth, img.clientHeight) ?? 'none';
/// ```
#[wasm_bindgen]
pub fn vignette_css(adjustments: &JsAdjustmentSet, width: f64, height: f64) -> Option<String> {
    PreviewStyle::compute(&adjustments.inner, &DisplaySize::new(width, height)).vignette
}
