//! VisionCut Core - Photo editing library
//!
//! This crate provides the editing core for VisionCut: the adjustment model,
//! crop coordinate mapping, the colour filter stack, vignette synthesis, and
//! the PNG export compositor. Browser bindings live in `visioncut-wasm`.
//!
//! The same [`FilterStack`] and [`Vignette`] drive both the CSS live preview
//! and the exported pixels, so the downloaded file matches what was on
//! screen.

pub mod adjustments;
pub mod encode;
pub mod export;
pub mod filter;
pub mod geometry;
pub mod handle;
pub mod preview;
pub mod session;
pub mod vignette;

pub use adjustments::{AdjustmentParam, AdjustmentSet};
pub use export::{
    deliver, export_and_download, export_png, render, DownloadSink, ExportError, ExportOptions,
    ExportTarget, ExportedImage,
};
pub use filter::{FilterOp, FilterStack};
pub use geometry::{resolve_source_region, AspectPreset, CropRectangle, CropUnit, SourceRegion};
pub use handle::{DisplaySize, ImageError, ImageHandle};
pub use preview::PreviewStyle;
pub use session::{
    complete_removal, export_session, remove_background, BackgroundRemover, EditorSession,
    RemovalError, RemovalTicket, SessionError,
};
pub use vignette::Vignette;
