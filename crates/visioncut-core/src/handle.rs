//! Loaded image handle.
//!
//! An [`ImageHandle`] pairs the decoded RGBA raster with the size the image is
//! currently rendered at on screen. Handles are immutable: a new file, a
//! finished background removal or a layout resize produces a new handle. The
//! raster itself is reference-counted, so re-creating a handle for a new
//! display size does not copy pixels.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when constructing an image handle.
#[derive(Debug, Error, PartialEq)]
pub enum ImageError {
    /// Natural width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Displayed size is zero, negative or not finite
    #[error("Invalid displayed size: {width}x{height}")]
    InvalidDisplaySize { width: f64, height: f64 },
}

/// On-screen size of the rendered image, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A loaded image: natural RGBA pixels plus displayed size.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    raster: Arc<RgbaImage>,
    displayed: DisplaySize,
}

impl ImageHandle {
    /// Create a handle from a decoded raster and the size it is shown at.
    pub fn new(raster: RgbaImage, displayed: DisplaySize) -> Result<Self, ImageError> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        if !displayed.is_valid() {
            return Err(ImageError::InvalidDisplaySize {
                width: displayed.width,
                height: displayed.height,
            });
        }
        Ok(Self {
            raster: Arc::new(raster),
            displayed,
        })
    }

    /// Create a handle from raw RGBA bytes (4 bytes per pixel, row-major).
    pub fn from_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        displayed: DisplaySize,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(ImageError::InvalidPixelData {
                expected,
                actual: pixels.len(),
            });
        }
        let raster = RgbaImage::from_raw(width, height, pixels).ok_or(
            ImageError::InvalidPixelData {
                expected,
                actual: 0,
            },
        )?;
        Self::new(raster, displayed)
    }

    /// A new handle over the same pixels, rendered at a different size.
    pub fn with_displayed_size(&self, displayed: DisplaySize) -> Result<Self, ImageError> {
        if !displayed.is_valid() {
            return Err(ImageError::InvalidDisplaySize {
                width: displayed.width,
                height: displayed.height,
            });
        }
        Ok(Self {
            raster: Arc::clone(&self.raster),
            displayed,
        })
    }

    /// Decoded pixel size `(width, height)`.
    pub fn natural_size(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Rendered size on screen.
    pub fn displayed_size(&self) -> DisplaySize {
        self.displayed
    }

    /// Natural pixels per displayed pixel, per axis.
    pub fn scale(&self) -> (f64, f64) {
        let (w, h) = self.natural_size();
        (
            w as f64 / self.displayed.width,
            h as f64 / self.displayed.height,
        )
    }

    /// Borrow the decoded pixels.
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// True if both handles share the same pixel storage.
    pub fn shares_raster_with(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.raster, &other.raster)
    }
}
