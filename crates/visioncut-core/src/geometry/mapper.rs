//! Displayed-crop → natural-pixel region mapping.

use super::CropRectangle;
use crate::handle::ImageHandle;
use serde::{Deserialize, Serialize};

/// Region of the natural image to export, in natural pixels.
///
/// The origin is signed: a crop dragged past the image edge yields a region
/// that starts outside the raster. Width and height are buffer dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl SourceRegion {
    /// The whole natural image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// True if the region has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels in the region.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Map a crop in displayed coordinates onto natural pixels.
///
/// An absent or invalid crop resolves to the full natural image. Otherwise
/// each field is multiplied by the per-axis scale `natural / displayed` and
/// floored. Flooring keeps the region from reaching one pixel past the
/// source edge when the crop touches it.
pub fn resolve_source_region(crop: Option<&CropRectangle>, image: &ImageHandle) -> SourceRegion {
    let (natural_w, natural_h) = image.natural_size();

    let crop = match crop {
        Some(crop) if crop.is_valid() => crop,
        Some(crop) => {
            tracing::debug!(?crop, "Invalid crop, using full image");
            return SourceRegion::full(natural_w, natural_h);
        }
        None => return SourceRegion::full(natural_w, natural_h),
    };

    let displayed = image.displayed_size();
    let px = crop.to_pixels(&displayed);
    let (scale_x, scale_y) = image.scale();

    // Float to int casts saturate, so absurd crops cannot wrap around.
    SourceRegion {
        x: (px.x * scale_x).floor() as i64,
        y: (px.y * scale_y).floor() as i64,
        width: (px.width * scale_x).floor() as u32,
        height: (px.height * scale_y).floor() as u32,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::handle::DisplaySize;
    use image::RgbaImage;
    use proptest::prelude::*;

    proptest! {
        /// Property: A crop inside the displayed image never maps past the natural bounds.
        #[test]
        fn prop_region_within_natural_bounds(
            natural_w in 1u32..=2000,
            natural_h in 1u32..=2000,
            displayed_w in 1.0f64..=1000.0,
            displayed_h in 1.0f64..=1000.0,
            fx in 0.0f64..=1.0,
            fy in 0.0f64..=1.0,
            fw in 0.0f64..=1.0,
            fh in 0.0f64..=1.0,
        ) {
            let img = ImageHandle::new(
                RgbaImage::new(natural_w, natural_h),
                DisplaySize::new(displayed_w, displayed_h),
            ).unwrap();

            let x = fx * displayed_w;
            let y = fy * displayed_h;
            let crop = CropRectangle::pixels(
                x,
                y,
                (displayed_w - x) * fw,
                (displayed_h - y) * fh,
            );

            let region = resolve_source_region(Some(&crop), &img);
            prop_assert!(region.x >= 0 && region.y >= 0);
            prop_assert!(region.x as u64 + region.width as u64 <= natural_w as u64);
            prop_assert!(region.y as u64 + region.height as u64 <= natural_h as u64);
            prop_assert!(region.width <= natural_w);
            prop_assert!(region.height <= natural_h);
        }

        /// Property: Resolution is deterministic.
        #[test]
        fn prop_resolution_is_deterministic(
            x in 0.0f64..=500.0,
            y in 0.0f64..=500.0,
            w in -10.0f64..=500.0,
            h in -10.0f64..=500.0,
        ) {
            let img = ImageHandle::new(
                RgbaImage::new(640, 480),
                DisplaySize::new(320.0, 240.0),
            ).unwrap();
            let crop = CropRectangle::pixels(x, y, w, h);

            prop_assert_eq!(
                resolve_source_region(Some(&crop), &img),
                resolve_source_region(Some(&crop), &img)
            );
        }
    }
}
