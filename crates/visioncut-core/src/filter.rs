//! Filter stack compiler
//!
//! Turns an [`AdjustmentSet`] into the ordered CSS filter chain the editor
//! shows in the live preview, and bakes the same chain into pixels for
//! export. Both paths read one [`FilterStack`], so the exported file matches
//! the preview.
//!
//! ## Filter Order
//! 1. brightness
//! 2. contrast
//! 3. saturate
//! 4. sepia (warm temperature)
//! 5. hue-rotate (cool temperature)
//!
//! ## Temperature
//! Warm and cool shifts use different transforms. A positive temperature is a
//! sepia of `temperature` percent; a negative one is a hue rotation of
//! `temperature * 1.5` degrees. Only one of the two is ever non-zero.
//!
//! ## Pixel Math
//! Each function uses the color matrix from the W3C Filter Effects module and
//! is applied in order on RGB in the 0-1 range, clamping after every
//! function. Alpha is never touched. Functions at their identity value are
//! skipped, so the default stack leaves pixels byte-identical.

use crate::adjustments::AdjustmentSet;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Degrees of hue rotation per unit of negative temperature.
pub const COOL_HUE_DEGREES_PER_UNIT: f32 = 1.5;

/// Sepia and hue-rotate components derived from a temperature value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureShift {
    /// Sepia amount in percent (0 to 100)
    pub sepia: f32,
    /// Hue rotation in degrees (0 or negative)
    pub hue_rotate: f32,
}

/// Split a temperature value into its warm and cool components.
pub fn decompose_temperature(temperature: f32) -> TemperatureShift {
    if temperature > 0.0 {
        TemperatureShift {
            sepia: temperature,
            hue_rotate: 0.0,
        }
    } else if temperature < 0.0 {
        TemperatureShift {
            sepia: 0.0,
            hue_rotate: temperature * COOL_HUE_DEGREES_PER_UNIT,
        }
    } else {
        TemperatureShift {
            sepia: 0.0,
            hue_rotate: 0.0,
        }
    }
}

/// A single CSS filter function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// `brightness(N%)`
    Brightness(f32),
    /// `contrast(N%)`
    Contrast(f32),
    /// `saturate(N%)`
    Saturate(f32),
    /// `sepia(N%)`
    Sepia(f32),
    /// `hue-rotate(Ndeg)`
    HueRotate(f32),
}

impl FilterOp {
    /// True if the function has no visual effect.
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterOp::Brightness(v) | FilterOp::Contrast(v) | FilterOp::Saturate(v) => v == 100.0,
            FilterOp::Sepia(v) => v == 0.0,
            FilterOp::HueRotate(v) => v == 0.0,
        }
    }

    /// CSS text for this function.
    pub fn to_css(&self) -> String {
        match *self {
            FilterOp::Brightness(v) => format!("brightness({}%)", v),
            FilterOp::Contrast(v) => format!("contrast({}%)", v),
            FilterOp::Saturate(v) => format!("saturate({}%)", v),
            FilterOp::Sepia(v) => format!("sepia({}%)", v),
            FilterOp::HueRotate(v) => format!("hue-rotate({}deg)", v),
        }
    }

    /// Color matrix for this function.
    pub fn matrix(&self) -> ColorMatrix {
        match *self {
            FilterOp::Brightness(v) => ColorMatrix::linear(v / 100.0, 0.0),
            FilterOp::Contrast(v) => {
                let amount = v / 100.0;
                ColorMatrix::linear(amount, 0.5 - 0.5 * amount)
            }
            FilterOp::Saturate(v) => ColorMatrix::saturate(v / 100.0),
            FilterOp::Sepia(v) => ColorMatrix::sepia(v / 100.0),
            FilterOp::HueRotate(v) => ColorMatrix::hue_rotate(v),
        }
    }
}

/// 3x4 RGB color matrix; the fourth column is a constant offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    pub m: [[f32; 4]; 3],
}

impl ColorMatrix {
    /// Same slope and intercept on every channel.
    fn linear(slope: f32, intercept: f32) -> Self {
        Self {
            m: [
                [slope, 0.0, 0.0, intercept],
                [0.0, slope, 0.0, intercept],
                [0.0, 0.0, slope, intercept],
            ],
        }
    }

    fn saturate(s: f32) -> Self {
        Self {
            m: [
                [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s, 0.0],
                [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s, 0.0],
                [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s, 0.0],
            ],
        }
    }

    fn sepia(amount: f32) -> Self {
        let k = 1.0 - amount.clamp(0.0, 1.0);
        Self {
            m: [
                [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k, 0.0],
                [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k, 0.0],
                [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k, 0.0],
            ],
        }
    }

    fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            m: [
                [
                    0.213 + cos * 0.787 - sin * 0.213,
                    0.715 - cos * 0.715 - sin * 0.715,
                    0.072 - cos * 0.072 + sin * 0.928,
                    0.0,
                ],
                [
                    0.213 - cos * 0.213 + sin * 0.143,
                    0.715 + cos * 0.285 + sin * 0.140,
                    0.072 - cos * 0.072 - sin * 0.283,
                    0.0,
                ],
                [
                    0.213 - cos * 0.213 - sin * 0.787,
                    0.715 - cos * 0.715 + sin * 0.715,
                    0.072 + cos * 0.928 + sin * 0.072,
                    0.0,
                ],
            ],
        }
    }

    /// Transform one RGB triple (0-1 range), clamping the result.
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let [r, g, b] = rgb;
        let row = |i: usize| {
            let m = &self.m[i];
            (m[0] * r + m[1] * g + m[2] * b + m[3]).clamp(0.0, 1.0)
        };
        [row(0), row(1), row(2)]
    }
}

/// The compiled filter chain for one adjustment set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterStack {
    /// Brightness in percent
    pub brightness: f32,
    /// Contrast in percent
    pub contrast: f32,
    /// Saturation in percent
    pub saturation: f32,
    /// Warm shift as sepia percent
    pub sepia: f32,
    /// Cool shift as hue rotation in degrees
    pub hue_rotate: f32,
}

impl Default for FilterStack {
    fn default() -> Self {
        FilterStack::compile(&AdjustmentSet::default())
    }
}

impl FilterStack {
    /// Compile the filter chain for an adjustment set.
    ///
    /// Pure: the input is not modified and equal inputs give equal stacks.
    pub fn compile(adjustments: &AdjustmentSet) -> Self {
        let shift = decompose_temperature(adjustments.temperature);
        Self {
            brightness: adjustments.brightness,
            contrast: adjustments.contrast,
            saturation: adjustments.saturation,
            sepia: shift.sepia,
            hue_rotate: shift.hue_rotate,
        }
    }

    /// Filter functions in application order.
    pub fn ops(&self) -> [FilterOp; 5] {
        [
            FilterOp::Brightness(self.brightness),
            FilterOp::Contrast(self.contrast),
            FilterOp::Saturate(self.saturation),
            FilterOp::Sepia(self.sepia),
            FilterOp::HueRotate(self.hue_rotate),
        ]
    }

    /// True if every function is at its identity value.
    pub fn is_identity(&self) -> bool {
        self.ops().iter().all(FilterOp::is_identity)
    }

    /// CSS `filter` property value.
    pub fn to_css(&self) -> String {
        self.ops()
            .iter()
            .map(FilterOp::to_css)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Bake the filter chain into RGBA pixels in place.
    pub fn apply(&self, image: &mut RgbaImage) {
        let matrices: Vec<ColorMatrix> = self
            .ops()
            .iter()
            .filter(|op| !op.is_identity())
            .map(FilterOp::matrix)
            .collect();

        // Early exit if no adjustments
        if matrices.is_empty() {
            return;
        }

        for pixel in image.pixels_mut() {
            let [r, g, b, _] = pixel.0;
            let mut rgb = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];
            for matrix in &matrices {
                rgb = matrix.apply(rgb);
            }
            pixel.0[0] = to_byte(rgb[0]);
            pixel.0[1] = to_byte(rgb[1]);
            pixel.0[2] = to_byte(rgb[2]);
        }
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
