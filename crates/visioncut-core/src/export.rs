//! Export compositor.
//!
//! Produces the downloadable PNG from the current image, crop and
//! adjustments. The steps are:
//! 1. Resolve the crop into a region of natural pixels
//! 2. Copy the region 1:1 into a fresh target of exactly that size
//! 3. Bake the filter stack into the target
//! 4. Composite the vignette, sized to the target, over the filtered pixels
//! 5. Encode to PNG and hand the bytes to a download sink
//!
//! Any failure is returned as an [`ExportError`]. Nothing is handed to the
//! sink unless every earlier step succeeded, so a failed export never
//! produces a partial file.

use crate::adjustments::AdjustmentSet;
use crate::encode::{encode_rgba_image, EncodeError, PngCompression};
use crate::filter::FilterStack;
use crate::geometry::{resolve_source_region, CropRectangle, SourceRegion};
use crate::handle::ImageHandle;
use crate::vignette::Vignette;
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default file name prefix for downloads.
pub const DEFAULT_FILENAME_PREFIX: &str = "VISION-CUT";

/// Largest export target, in pixels. Matches the canvas area limit browsers
/// enforce (16384 x 16384).
pub const MAX_EXPORT_PIXELS: u64 = 16_384 * 16_384;

/// Errors that can occur while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The resolved region has no pixels
    #[error("Export region is empty: {width}x{height}")]
    EmptyRegion { width: u32, height: u32 },

    /// The region lies entirely outside the source image
    #[error(
        "Export region {width}x{height} at ({x}, {y}) does not overlap the {image_width}x{image_height} image"
    )]
    RegionOutsideImage {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// The export target would exceed the allocation limit
    #[error("Export target {width}x{height} exceeds the {max} pixel limit")]
    TargetTooLarge { width: u32, height: u32, max: u64 },

    /// PNG encoding failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The download sink rejected the file
    #[error("Download failed: {0}")]
    Delivery(String),
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// File name prefix, followed by `-<timestamp>.png`
    pub filename_prefix: String,
    /// PNG compression effort
    pub compression: PngCompression,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            compression: PngCompression::Best,
        }
    }
}

/// Download file name for an export made at `timestamp_ms` (Unix epoch millis).
pub fn export_filename(prefix: &str, timestamp_ms: u64) -> String {
    format!("{}-{}.png", prefix, timestamp_ms)
}

/// Off-screen raster for a single export.
///
/// Sized to the resolved region and never reused.
#[derive(Debug)]
pub struct ExportTarget {
    region: SourceRegion,
    pixels: RgbaImage,
}

impl ExportTarget {
    /// Copy `region` out of `source` at 1:1 scale into a fresh target.
    ///
    /// Parts of the region outside the source stay transparent. A region
    /// with no overlap at all is an error. Every size and overlap check runs
    /// before any pixels are allocated.
    fn draw(region: SourceRegion, source: &RgbaImage) -> Result<Self, ExportError> {
        if region.is_empty() {
            return Err(ExportError::EmptyRegion {
                width: region.width,
                height: region.height,
            });
        }
        if region.pixel_count() > MAX_EXPORT_PIXELS {
            return Err(ExportError::TargetTooLarge {
                width: region.width,
                height: region.height,
                max: MAX_EXPORT_PIXELS,
            });
        }

        let (src_w, src_h) = source.dimensions();
        let r = region;

        if r.x == 0 && r.y == 0 && r.width == src_w && r.height == src_h {
            return Ok(Self {
                region,
                pixels: source.clone(),
            });
        }

        let left = r.x.max(0);
        let top = r.y.max(0);
        let right = r.x.saturating_add(r.width as i64).min(src_w as i64);
        let bottom = r.y.saturating_add(r.height as i64).min(src_h as i64);

        if right <= left || bottom <= top {
            return Err(ExportError::RegionOutsideImage {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                image_width: src_w,
                image_height: src_h,
            });
        }

        let mut pixels = RgbaImage::new(r.width, r.height);
        let patch = imageops::crop_imm(
            source,
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        )
        .to_image();
        imageops::replace(&mut pixels, &patch, left - r.x, top - r.y);
        Ok(Self { region, pixels })
    }

    /// Region of the natural image this target holds.
    pub fn region(&self) -> SourceRegion {
        self.region
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Composited pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}

/// An encoded export ready for download.
#[derive(Clone)]
pub struct ExportedImage {
    /// Region of the natural image that was exported
    pub region: SourceRegion,
    /// PNG bytes
    pub png: Vec<u8>,
}

impl fmt::Debug for ExportedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedImage")
            .field("region", &self.region)
            .field("png_len", &self.png.len())
            .finish()
    }
}

/// Receiver for finished exports, e.g. a browser download.
pub trait DownloadSink {
    type Error: fmt::Display;

    /// Deliver `png` under `filename`.
    fn deliver(&mut self, filename: &str, png: &[u8]) -> Result<(), Self::Error>;
}

/// Composite the export target without encoding it.
///
/// Steps 1-4 of the export: region, draw, filters, vignette.
pub fn render(
    image: &ImageHandle,
    crop: Option<&CropRectangle>,
    adjustments: &AdjustmentSet,
) -> Result<ExportTarget, ExportError> {
    let region = resolve_source_region(crop, image);
    tracing::debug!(
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        "Resolved export region"
    );

    let mut target = ExportTarget::draw(region, image.raster())?;

    let filters = FilterStack::compile(adjustments);
    if !filters.is_identity() {
        tracing::debug!(filter = %filters.to_css(), "Applying filter stack");
        filters.apply(&mut target.pixels);
    }

    // The overlay is synthesized for the target's own size, not the preview's.
    if adjustments.vignette > 0.0 {
        if let Some(vignette) = Vignette::synthesize(
            adjustments.vignette,
            target.width() as f64,
            target.height() as f64,
        ) {
            tracing::debug!(
                radius = vignette.radius,
                alpha = vignette.edge_alpha,
                "Compositing vignette"
            );
            vignette.composite(&mut target.pixels);
        }
    }

    Ok(target)
}

/// Render and encode the export.
pub fn export_png(
    image: &ImageHandle,
    crop: Option<&CropRectangle>,
    adjustments: &AdjustmentSet,
    options: &ExportOptions,
) -> Result<ExportedImage, ExportError> {
    let target = render(image, crop, adjustments)?;
    let png = encode_rgba_image(target.pixels(), options.compression)?;
    Ok(ExportedImage {
        region: target.region(),
        png,
    })
}

/// Hand a finished export to `sink` under `filename`.
pub fn deliver<S: DownloadSink>(
    exported: &ExportedImage,
    filename: &str,
    sink: &mut S,
) -> Result<(), ExportError> {
    sink.deliver(filename, &exported.png)
        .map_err(|e| ExportError::Delivery(e.to_string()))?;
    tracing::debug!(%filename, bytes = exported.png.len(), "Export delivered");
    Ok(())
}

/// Render, encode and deliver the export to `sink`.
///
/// Returns the file name on success. On failure the error is logged and
/// returned; the sink is only called once the PNG is complete.
pub fn export_and_download<S: DownloadSink>(
    image: &ImageHandle,
    crop: Option<&CropRectangle>,
    adjustments: &AdjustmentSet,
    options: &ExportOptions,
    timestamp_ms: u64,
    sink: &mut S,
) -> Result<String, ExportError> {
    let result = export_png(image, crop, adjustments, options).and_then(|exported| {
        let filename = export_filename(&options.filename_prefix, timestamp_ms);
        deliver(&exported, &filename, sink)?;
        Ok(filename)
    });

    if let Err(ref e) = result {
        tracing::warn!(error = %e, "Export failed");
    }
    result
}
