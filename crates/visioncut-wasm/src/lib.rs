//! VisionCut WASM - WebAssembly bindings for VisionCut
//!
//! This crate exposes the visioncut-core editing pipeline to the browser.
//!
//! # Module Structure
//!
//! - `editor` - The `Editor` object: session state, preview CSS, export, background removal
//! - `adjustments` - Standalone adjustment set and preview CSS helpers
//! - `types` - WASM-compatible wrapper types for image data
//! - `download` - Browser download sink for exported PNGs
//! - `removal` - Bridge from a JS segmentation callback to the core removal flow
//! - `errors` - Conversions between Rust errors and JS values
//!
//! # Usage
//!
//! ```typescript
//! import init, { Editor } from '@visioncut/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const editor = new Editor();
//! editor.load_image(width, height, rgba, img.clientWidth, img.clientHeight);
//! img.style.filter = editor.filter_css;
//! ```

use wasm_bindgen::prelude::*;

mod adjustments;
mod download;
mod editor;
mod errors;
mod removal;
mod types;

// Re-export public types
pub use adjustments::{vignette_css, JsAdjustmentSet};
pub use editor::{Editor, ExportOutcome};
pub use types::JsImage;

/// Initialize the WASM module (called automatically on load).
///
/// Routes panics and log records, including the core's `tracing` events, to
/// the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(level);
    log::info!("VisionCut WASM {} ready", version());
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
