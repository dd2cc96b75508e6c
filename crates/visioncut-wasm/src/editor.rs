//! Editor WASM bindings.
//!
//! [`Editor`] is the object the page holds for its whole lifetime. UI events
//! (slider input, crop drags, aspect buttons, file selection) are forwarded
//! to it; it hands back CSS strings for the preview and performs exports and
//! background removal.
//!
//! # Example
//!
//! ```typescript
//! import init, { Editor } from '@visioncut/wasm';
//!
//! await init();
//! const editor = new Editor();
//! editor.load_image(bitmap.width, bitmap.height, rgba, img.clientWidth, img.clientHeight);
//!
//! slider.oninput = () => {
//!     editor.set_adjustment('brightness', slider.valueAsNumber);
//!     img.style.filter = editor.filter_css ?? 'none';
//! };
//!
//! const outcome = editor.export();
//! if (!outcome.ok) showToast(outcome.error);
//!
//! button.disabled = true;
//! try {
//!     await editor.remove_background(segment);
//! } finally {
//!     button.disabled = false;
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use visioncut_core::export::render;
use visioncut_core::{
    complete_removal, export_session, AdjustmentParam, AspectPreset, CropRectangle, DisplaySize,
    DownloadSink, EditorSession, ExportOptions, ImageHandle, SessionError,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::adjustments::JsAdjustmentSet;
use crate::download::BrowserDownload;
use crate::errors::to_js_error;
use crate::removal::JsBackgroundRemover;
use crate::types::JsImage;

/// Result of an export, reported to the page instead of throwing.
#[wasm_bindgen]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    filename: Option<String>,
    error: Option<String>,
}

#[wasm_bindgen]
impl ExportOutcome {
    /// Whether the file was produced and handed to the browser
    #[wasm_bindgen(getter)]
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    /// Download file name, set on success
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> Option<String> {
        self.filename.clone()
    }

    /// User-facing error message, set on failure
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }
}

impl From<Result<String, SessionError>> for ExportOutcome {
    fn from(result: Result<String, SessionError>) -> Self {
        match result {
            Ok(filename) => Self {
                filename: Some(filename),
                error: None,
            },
            Err(e) => Self {
                filename: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// The photo editor.
#[wasm_bindgen]
pub struct Editor {
    state: Rc<RefCell<EditorSession>>,
}

#[wasm_bindgen]
impl Editor {
    /// Create an editor with default export options
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::from_session(EditorSession::new())
    }

    /// Create an editor with export options given as a plain object,
    /// e.g. `{ filename_prefix: "MY-EDIT", compression: "fast" }`.
    /// Missing fields keep their defaults.
    pub fn with_options(options: JsValue) -> Result<Editor, JsValue> {
        let options = parse_export_options(options)?;
        Ok(Self::from_session(EditorSession::with_export_options(
            options,
        )))
    }

    /// Replace the export options
    pub fn set_export_options(&self, options: JsValue) -> Result<(), JsValue> {
        let options = parse_export_options(options)?;
        self.state.borrow_mut().set_export_options(options);
        Ok(())
    }

    // ---- image -------------------------------------------------------------

    /// Load a decoded image.
    ///
    /// # Arguments
    /// * `width`, `height` - Natural size in pixels
    /// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
    /// * `displayed_width`, `displayed_height` - On-screen size of the image element
    pub fn load_image(
        &self,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        displayed_width: f64,
        displayed_height: f64,
    ) -> Result<(), JsValue> {
        self.load_rgba(width, height, pixels, displayed_width, displayed_height)
            .map_err(to_js_error)
    }

    /// Whether an image is loaded
    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.state.borrow().image().is_some()
    }

    /// The current image at natural size, e.g. to redraw after background removal
    pub fn current_image(&self) -> Option<JsImage> {
        self.state.borrow().image().map(JsImage::from_handle)
    }

    /// Call when the image element is resized
    pub fn set_displayed_size(&self, width: f64, height: f64) -> Result<(), JsValue> {
        self.state
            .borrow_mut()
            .set_displayed_size(DisplaySize::new(width, height))
            .map_err(to_js_error)
    }

    // ---- adjustments -------------------------------------------------------

    /// Set one adjustment by name (`brightness`, `contrast`, `saturation`,
    /// `temperature` or `vignette`). The value is clamped to its range.
    pub fn set_adjustment(&self, name: &str, value: f32) -> Result<(), JsValue> {
        self.set_adjustment_by_name(name, value).map_err(to_js_error)
    }

    /// Current value of one adjustment
    pub fn adjustment(&self, name: &str) -> Result<f32, JsValue> {
        let param = parse_param(name).map_err(to_js_error)?;
        Ok(self.state.borrow().adjustments().get(param))
    }

    /// Snapshot of all adjustments
    pub fn adjustments(&self) -> JsAdjustmentSet {
        JsAdjustmentSet::from_inner(*self.state.borrow().adjustments())
    }

    /// Replace all adjustments at once
    pub fn set_adjustments(&self, adjustments: &JsAdjustmentSet) {
        *self.state.borrow_mut().adjustments_mut() = adjustments.inner().clamped();
    }

    /// Restore every adjustment to its default
    pub fn reset_adjustments(&self) {
        self.state.borrow_mut().reset_adjustments();
    }

    // ---- crop --------------------------------------------------------------

    /// Select an aspect preset (`free`, `1:1`, `4:3`, `16:9`, `9:16`).
    /// The crop is replaced by a centred one.
    pub fn set_aspect(&self, label: &str) -> Result<(), JsValue> {
        self.set_aspect_by_label(label).map_err(to_js_error)
    }

    /// Label of the current aspect preset
    #[wasm_bindgen(getter)]
    pub fn aspect(&self) -> String {
        aspect_label(self.state.borrow().aspect()).to_string()
    }

    /// Crop reported while dragging, as `{ x, y, width, height, unit }`
    pub fn update_crop(&self, crop: JsValue) -> Result<(), JsValue> {
        let crop = parse_crop(crop)?;
        self.state.borrow_mut().update_crop(crop);
        Ok(())
    }

    /// Crop reported on release; this is the crop that gets exported
    pub fn commit_crop(&self, crop: JsValue) -> Result<(), JsValue> {
        let crop = parse_crop(crop)?;
        self.state.borrow_mut().commit_crop(crop);
        Ok(())
    }

    /// Remove the crop so the whole image is exported
    pub fn clear_crop(&self) {
        self.state.borrow_mut().clear_crop();
    }

    /// The crop to show in the crop widget, or `undefined`
    pub fn live_crop(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.state.borrow().live_crop())
    }

    /// The crop used for export, or `undefined`
    pub fn committed_crop(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.state.borrow().committed_crop())
    }

    // ---- preview -----------------------------------------------------------

    /// CSS `filter` for the on-screen image, `undefined` before an image is loaded
    #[wasm_bindgen(getter)]
    pub fn filter_css(&self) -> Option<String> {
        self.state.borrow().preview().map(|p| p.filter)
    }

    /// CSS `background-image` for the vignette overlay, `undefined` when off
    #[wasm_bindgen(getter)]
    pub fn vignette_css(&self) -> Option<String> {
        self.state.borrow().preview().and_then(|p| p.vignette)
    }

    // ---- export ------------------------------------------------------------

    /// Composite the export without encoding or downloading it
    pub fn render(&self) -> Result<JsImage, JsValue> {
        let session = self.state.borrow();
        let image = session
            .image()
            .ok_or_else(|| to_js_error(SessionError::NoImage))?;
        let target = render(image, session.committed_crop(), session.adjustments())
            .map_err(to_js_error)?;
        Ok(JsImage::from_rgba(target.into_pixels()))
    }

    /// Export a PNG and download it as `<prefix>-<timestamp>.png`.
    ///
    /// Never throws; failures are reported in the returned outcome and
    /// logged to the console.
    pub fn export(&self) -> ExportOutcome {
        let timestamp_ms = js_sys::Date::now().max(0.0) as u64;
        self.export_to(timestamp_ms, &mut BrowserDownload)
    }

    // ---- background removal ------------------------------------------------

    /// Whether a background removal is currently running
    #[wasm_bindgen(getter)]
    pub fn removal_in_flight(&self) -> bool {
        self.state.borrow().is_removal_in_flight()
    }

    /// Remove the background from the current image using `segment`.
    ///
    /// `segment` is called as `segment(width, height, rgba)` and must resolve
    /// to `{ width, height, pixels }`. The returned promise resolves once
    /// the new image is in place and rejects with a message if the call
    /// failed or another removal is already running. Adjustments are kept.
    ///
    /// `removal_in_flight` is true as soon as this returns.
    pub fn remove_background(&self, segment: js_sys::Function) -> js_sys::Promise {
        let ticket = match self.state.borrow_mut().begin_removal() {
            Ok(ticket) => ticket,
            Err(e) => {
                log::warn!("Background removal rejected: {}", e);
                return js_sys::Promise::reject(&to_js_error(e));
            }
        };

        let state = Rc::clone(&self.state);
        future_to_promise(async move {
            let remover = JsBackgroundRemover::new(segment);
            complete_removal(&state, ticket, &remover)
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(to_js_error)
        })
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    fn from_session(session: EditorSession) -> Self {
        Self {
            state: Rc::new(RefCell::new(session)),
        }
    }

    fn load_rgba(
        &self,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        displayed_width: f64,
        displayed_height: f64,
    ) -> Result<(), SessionError> {
        let displayed = DisplaySize::new(displayed_width, displayed_height);
        let handle = ImageHandle::from_rgba(width, height, pixels, displayed)?;
        self.state.borrow_mut().load_image(handle);
        Ok(())
    }

    fn set_adjustment_by_name(&self, name: &str, value: f32) -> Result<(), String> {
        let param = parse_param(name)?;
        self.state.borrow_mut().set_adjustment(param, value);
        Ok(())
    }

    fn set_aspect_by_label(&self, label: &str) -> Result<(), String> {
        let aspect = AspectPreset::from_label(label)
            .ok_or_else(|| format!("Unknown aspect preset: {}", label))?;
        self.state.borrow_mut().set_aspect(aspect);
        Ok(())
    }

    /// The session is not borrowed while `sink` runs, so page handlers
    /// fired by the download may call back into the editor.
    fn export_to<S: DownloadSink>(&self, timestamp_ms: u64, sink: &mut S) -> ExportOutcome {
        export_session(&self.state, timestamp_ms, sink).into()
    }
}

fn parse_param(name: &str) -> Result<AdjustmentParam, String> {
    AdjustmentParam::from_name(name).ok_or_else(|| format!("Unknown adjustment: {}", name))
}

fn aspect_label(aspect: AspectPreset) -> &'static str {
    match aspect {
        AspectPreset::Free => "free",
        AspectPreset::Square => "1:1",
        AspectPreset::Standard4x3 => "4:3",
        AspectPreset::Wide16x9 => "16:9",
        AspectPreset::Portrait9x16 => "9:16",
    }
}

fn parse_crop(value: JsValue) -> Result<CropRectangle, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn parse_export_options(value: JsValue) -> Result<ExportOptions, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(ExportOptions::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn to_js_value<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde::Serialize;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Serialize)]
    struct TestCrop {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        unit: &'static str,
    }

    fn loaded_editor() -> Editor {
        let editor = Editor::new();
        editor
            .load_image(8, 8, vec![255u8; 8 * 8 * 4], 4.0, 4.0)
            .unwrap();
        editor
    }

    #[wasm_bindgen_test]
    fn test_commit_crop_from_js() {
        let editor = loaded_editor();
        let crop = TestCrop {
            x: 1.0,
            y: 1.0,
            width: 2.0,
            height: 2.0,
            unit: "px",
        };
        editor
            .commit_crop(serde_wasm_bindgen::to_value(&crop).unwrap())
            .unwrap();

        let rendered = editor.render().unwrap();
        assert_eq!((rendered.width(), rendered.height()), (4, 4));
    }

    #[wasm_bindgen_test]
    fn test_invalid_crop_rejected() {
        let editor = loaded_editor();
        assert!(editor.commit_crop(JsValue::from_str("not a crop")).is_err());
    }

    #[wasm_bindgen_test]
    fn test_export_options_from_js() {
        let options = js_sys::JSON::parse(r#"{"filename_prefix":"MINE"}"#).unwrap();
        let editor = Editor::with_options(options).unwrap();
        editor.load_image(2, 2, vec![0u8; 16], 2.0, 2.0).unwrap();

        let mut sink = NullSink;
        let outcome = editor.export_to(3, &mut sink);
        assert_eq!(outcome.filename().as_deref(), Some("MINE-3.png"));
    }

    #[wasm_bindgen_test]
    async fn test_remove_background_replaces_image() {
        let editor = loaded_editor();
        let segment = js_sys::Function::new_with_args(
            "w, h, px",
            "return Promise.resolve({ width: w, height: h, pixels: new Uint8Array(px.length) });",
        );

        JsFuture::from(editor.remove_background(segment))
            .await
            .unwrap();

        assert!(!editor.removal_in_flight());
        let image = editor.current_image().unwrap();
        assert!(image.pixels().iter().all(|&b| b == 0));
    }

    #[wasm_bindgen_test]
    async fn test_second_removal_rejected_while_pending() {
        let editor = loaded_editor();
        let slow = js_sys::Function::new_with_args(
            "w, h, px",
            "return new Promise(r => setTimeout(() => r({ width: w, height: h, pixels: px }), 10));",
        );

        let first = editor.remove_background(slow.clone());
        assert!(editor.removal_in_flight());
        let second = JsFuture::from(editor.remove_background(slow)).await;
        assert!(second.is_err());

        JsFuture::from(first).await.unwrap();
        assert!(!editor.removal_in_flight());
    }

    #[wasm_bindgen_test]
    async fn test_failed_removal_keeps_image() {
        let editor = loaded_editor();
        let failing =
            js_sys::Function::new_with_args("w, h, px", "return Promise.reject('offline');");

        let result = JsFuture::from(editor.remove_background(failing)).await;
        assert!(result.is_err());
        assert!(!editor.removal_in_flight());
        assert!(editor
            .current_image()
            .unwrap()
            .pixels()
            .iter()
            .all(|&b| b == 255));
    }

    struct NullSink;

    impl DownloadSink for NullSink {
        type Error = String;

        fn deliver(&mut self, _filename: &str, _png: &[u8]) -> Result<(), String> {
            Ok(())
        }
    }
}
