//! Crop rectangles as reported by the crop widget.
//!
//! A rectangle is either in percent of the displayed image or in displayed
//! pixels. Rectangles with a non-positive width or height mean "no crop"; the
//! mapper treats them as the full image rather than as an error.
//!
//! # Example
//!
//! ```ignore
//! // Centred 16:9 crop for an image shown at 800x600
//! let crop = CropRectangle::centered(AspectPreset::Wide16x9, &DisplaySize::new(800.0, 600.0));
//! assert_eq!(crop.unit, CropUnit::Percent);
//! ```

use crate::handle::DisplaySize;
use serde::{Deserialize, Serialize};

/// Fraction of the displayed image the initial crop may occupy on each axis.
const INITIAL_CROP_FRACTION: f64 = 0.9;

/// Unit of a crop rectangle's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropUnit {
    /// Percent of the displayed image (0 to 100)
    #[serde(rename = "%")]
    Percent,
    /// Displayed (CSS) pixels
    #[default]
    #[serde(rename = "px")]
    Pixel,
}

/// Crop rectangle in displayed-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: CropUnit,
}

impl CropRectangle {
    /// Crop in displayed pixels.
    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Pixel,
        }
    }

    /// Crop in percent of the displayed image.
    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: CropUnit::Percent,
        }
    }

    /// A rectangle is valid when every field is finite and it has a positive area.
    ///
    /// Invalid rectangles mean "export the whole image".
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Express this rectangle in displayed pixels.
    pub fn to_pixels(&self, displayed: &DisplaySize) -> CropRectangle {
        match self.unit {
            CropUnit::Pixel => *self,
            CropUnit::Percent => CropRectangle::pixels(
                self.x / 100.0 * displayed.width,
                self.y / 100.0 * displayed.height,
                self.width / 100.0 * displayed.width,
                self.height / 100.0 * displayed.height,
            ),
        }
    }

    /// Initial crop for a freshly displayed image.
    ///
    /// The largest rectangle of the preset's aspect ratio that fits within
    /// 90% of the displayed width and height, centred, in percent units. A
    /// free aspect gives a centred 90% x 90% crop.
    pub fn centered(aspect: AspectPreset, displayed: &DisplaySize) -> CropRectangle {
        let max_w = displayed.width * INITIAL_CROP_FRACTION;
        let max_h = displayed.height * INITIAL_CROP_FRACTION;

        let (w_px, h_px) = match aspect.ratio() {
            None => (max_w, max_h),
            Some(ratio) => {
                let h_for_full_width = max_w / ratio;
                if h_for_full_width <= max_h {
                    (max_w, h_for_full_width)
                } else {
                    (max_h * ratio, max_h)
                }
            }
        };

        let w_pct = w_px / displayed.width * 100.0;
        let h_pct = h_px / displayed.height * 100.0;
        CropRectangle::percent((100.0 - w_pct) / 2.0, (100.0 - h_pct) / 2.0, w_pct, h_pct)
    }
}

/// Aspect ratio presets offered by the crop toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectPreset {
    #[default]
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Standard4x3,
    #[serde(rename = "16:9")]
    Wide16x9,
    #[serde(rename = "9:16")]
    Portrait9x16,
}

impl AspectPreset {
    /// Width / height, or `None` for a free crop.
    pub fn ratio(self) -> Option<f64> {
        match self {
            AspectPreset::Free => None,
            AspectPreset::Square => Some(1.0),
            AspectPreset::Standard4x3 => Some(4.0 / 3.0),
            AspectPreset::Wide16x9 => Some(16.0 / 9.0),
            AspectPreset::Portrait9x16 => Some(9.0 / 16.0),
        }
    }

    /// Parse the label shown on the toolbar button.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "free" => Some(AspectPreset::Free),
            "1:1" => Some(AspectPreset::Square),
            "4:3" => Some(AspectPreset::Standard4x3),
            "16:9" => Some(AspectPreset::Wide16x9),
            "9:16" => Some(AspectPreset::Portrait9x16),
            _ => None,
        }
    }
}
