//! Tonal adjustment model
//!
//! Holds the five slider parameters the editor exposes. The model is plain
//! data: the filter stack and the vignette read it, nothing here touches
//! pixels.
//!
//! ## Parameters
//! | parameter   | range       | default |
//! |-------------|-------------|---------|
//! | brightness  | 0 to 200    | 100     |
//! | contrast    | 0 to 200    | 100     |
//! | saturation  | 0 to 200    | 100     |
//! | temperature | -100 to 100 | 0       |
//! | vignette    | 0 to 200    | 0       |
//!
//! The pipeline assumes values are already inside these ranges. UI bindings
//! clamp at the input boundary through [`AdjustmentSet::set`].

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Valid range for brightness, contrast and saturation (percent, 100 = identity).
pub const PERCENT_RANGE: RangeInclusive<f32> = 0.0..=200.0;

/// Valid range for the warm/cool temperature shift.
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = -100.0..=100.0;

/// Valid range for vignette intensity.
pub const VIGNETTE_RANGE: RangeInclusive<f32> = 0.0..=200.0;

/// One of the five adjustable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentParam {
    Brightness,
    Contrast,
    Saturation,
    Temperature,
    Vignette,
}

impl AdjustmentParam {
    /// All parameters in filter order.
    pub const ALL: [AdjustmentParam; 5] = [
        AdjustmentParam::Brightness,
        AdjustmentParam::Contrast,
        AdjustmentParam::Saturation,
        AdjustmentParam::Temperature,
        AdjustmentParam::Vignette,
    ];

    /// Inclusive range accepted for this parameter.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            AdjustmentParam::Brightness
            | AdjustmentParam::Contrast
            | AdjustmentParam::Saturation => PERCENT_RANGE,
            AdjustmentParam::Temperature => TEMPERATURE_RANGE,
            AdjustmentParam::Vignette => VIGNETTE_RANGE,
        }
    }

    /// Value at which the parameter has no visual effect.
    pub fn default_value(self) -> f32 {
        match self {
            AdjustmentParam::Brightness
            | AdjustmentParam::Contrast
            | AdjustmentParam::Saturation => 100.0,
            AdjustmentParam::Temperature | AdjustmentParam::Vignette => 0.0,
        }
    }

    /// Parse the lowercase name used by the UI controls.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "brightness" => Some(AdjustmentParam::Brightness),
            "contrast" => Some(AdjustmentParam::Contrast),
            "saturation" => Some(AdjustmentParam::Saturation),
            "temperature" => Some(AdjustmentParam::Temperature),
            "vignette" => Some(AdjustmentParam::Vignette),
            _ => None,
        }
    }

    /// Clamp a raw control value into this parameter's range.
    ///
    /// Non-finite input falls back to the default value.
    pub fn clamp(self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default_value();
        }
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }
}

/// The five tonal parameters applied to the current image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentSet {
    /// Multiplicative luminance in percent (0 to 200, 100 = identity)
    pub brightness: f32,
    /// Multiplicative contrast in percent (0 to 200, 100 = identity)
    pub contrast: f32,
    /// Multiplicative chroma in percent (0 to 200, 100 = identity)
    pub saturation: f32,
    /// Warm/cool shift (-100 to 100, 0 = identity)
    pub temperature: f32,
    /// Radial darkening strength (0 to 200, 0 = none)
    pub vignette: f32,
}

impl Default for AdjustmentSet {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            temperature: 0.0,
            vignette: 0.0,
        }
    }
}

impl AdjustmentSet {
    /// Create an adjustment set with every parameter at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Restore every parameter to its default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Read a single parameter.
    pub fn get(&self, param: AdjustmentParam) -> f32 {
        match param {
            AdjustmentParam::Brightness => self.brightness,
            AdjustmentParam::Contrast => self.contrast,
            AdjustmentParam::Saturation => self.saturation,
            AdjustmentParam::Temperature => self.temperature,
            AdjustmentParam::Vignette => self.vignette,
        }
    }

    /// Write a single parameter, clamped to its range.
    ///
    /// This is the input boundary: values written here are always valid for
    /// the filter stack and vignette.
    pub fn set(&mut self, param: AdjustmentParam, value: f32) {
        let value = param.clamp(value);
        match param {
            AdjustmentParam::Brightness => self.brightness = value,
            AdjustmentParam::Contrast => self.contrast = value,
            AdjustmentParam::Saturation => self.saturation = value,
            AdjustmentParam::Temperature => self.temperature = value,
            AdjustmentParam::Vignette => self.vignette = value,
        }
    }

    /// Return a copy with every parameter clamped to its range.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for param in AdjustmentParam::ALL {
            out.set(param, self.get(param));
        }
        out
    }
}
