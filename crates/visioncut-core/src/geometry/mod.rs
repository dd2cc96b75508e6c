//! Crop geometry: crop rectangles and the displayed → natural mapping.
//!
//! # Coordinate Systems
//!
//! Three coordinate systems meet here:
//! 1. Displayed pixels: where the crop widget draws, the size of the `<img>`
//!    element on screen
//! 2. Natural pixels: the decoded image
//! 3. Export pixels: the freshly allocated export target, whose origin is the
//!    region origin in natural pixels
//!
//! The crop widget reports rectangles in displayed pixels or in percent of
//! the displayed image. [`resolve_source_region`] turns that into a region of
//! natural pixels; the export target is sized to that region exactly, so
//! export pixels map 1:1 onto natural pixels.
//!
//! Origin is the top-left corner in every system.

mod crop;
mod mapper;

pub use crop::{AspectPreset, CropRectangle, CropUnit};
pub use mapper::{resolve_source_region, SourceRegion};
