//! Radial vignette overlay.
//!
//! The vignette darkens toward the edges with a circular black gradient that
//! is composited on top of the filtered image. It is never affected by the
//! filter stack.
//!
//! One formula drives both the live preview (as a CSS radial gradient over
//! the displayed image) and the export (composited per pixel at natural
//! resolution):
//!
//! - center: `(W/2, H/2)`
//! - outer radius: `sqrt((W/2)^2 + (H/2)^2) * (1.2 - v/100)`, at least 1
//! - alpha: 0 at the center, rising linearly to `min(v/100, 0.85)` at the
//!   outer radius and holding that value beyond it

/// Ceiling on the overlay alpha so the image is never fully obscured.
pub const MAX_VIGNETTE_ALPHA: f32 = 0.85;

/// Smallest outer radius, in target pixels.
pub const MIN_VIGNETTE_RADIUS: f64 = 1.0;

/// Radius multiplier at zero intensity.
const RADIUS_BASE_FACTOR: f64 = 1.2;

/// Alpha of the outer gradient stop for an intensity.
pub fn edge_alpha(intensity: f32) -> f32 {
    (intensity / 100.0).clamp(0.0, MAX_VIGNETTE_ALPHA)
}

/// Outer gradient radius for an intensity and target size.
pub fn outer_radius(intensity: f32, width: f64, height: f64) -> f64 {
    let half_diagonal = ((width / 2.0).powi(2) + (height / 2.0).powi(2)).sqrt();
    let radius = half_diagonal * (RADIUS_BASE_FACTOR - intensity as f64 / 100.0);
    radius.max(MIN_VIGNETTE_RADIUS)
}

/// A synthesized vignette for one target size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vignette {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub edge_alpha: f32,
}

impl Vignette {
    /// Build the overlay for a `width` x `height` target.
    ///
    /// Returns `None` when the intensity is zero (or below): no overlay is
    /// drawn at all.
    pub fn synthesize(intensity: f32, width: f64, height: f64) -> Option<Self> {
        if intensity <= 0.0 || !intensity.is_finite() {
            return None;
        }
        Some(Self {
            center_x: width / 2.0,
            center_y: height / 2.0,
            radius: outer_radius(intensity, width, height),
            edge_alpha: edge_alpha(intensity),
        })
    }

    /// Overlay alpha at a point in target coordinates.
    #[inline]
    pub fn alpha_at(&self, x: f64, y: f64) -> f32 {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let t = ((dx * dx + dy * dy).sqrt() / self.radius).min(1.0);
        self.edge_alpha * t as f32
    }

    /// Composite the overlay onto RGBA pixels with source-over blending.
    ///
    /// The gradient is sampled at pixel centers.
    pub fn composite(&self, image: &mut image::RgbaImage) {
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let alpha = self.alpha_at(x as f64 + 0.5, y as f64 + 0.5);
            if alpha <= 0.0 {
                continue;
            }

            let [r, g, b, a] = pixel.0;
            let dst_a = a as f32 / 255.0;
            let out_a = alpha + dst_a * (1.0 - alpha);
            if out_a <= 0.0 {
                continue;
            }

            // Source color is black, so only the destination term remains.
            let keep = dst_a * (1.0 - alpha) / out_a;
            pixel.0 = [
                (r as f32 * keep).round() as u8,
                (g as f32 * keep).round() as u8,
                (b as f32 * keep).round() as u8,
                (out_a * 255.0).round() as u8,
            ];
        }
    }

    /// CSS `background-image` value drawing the same gradient over an
    /// element of the size this vignette was synthesized for.
    pub fn to_css(&self) -> String {
        format!(
            "radial-gradient(circle {:.2}px at 50% 50%, rgba(0, 0, 0, 0) 0%, rgba(0, 0, 0, {:.3}) 100%)",
            self.radius, self.edge_alpha
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_zero_intensity_no_overlay() {
        assert!(Vignette::synthesize(0.0, 100.0, 100.0).is_none());
    }

    #[test]
    fn test_edge_alpha_cap() {
        assert!((edge_alpha(50.0) - 0.5).abs() < 1e-6);
        assert!((edge_alpha(85.0) - 0.85).abs() < 1e-6);
        assert_eq!(edge_alpha(100.0), MAX_VIGNETTE_ALPHA);
        assert_eq!(edge_alpha(200.0), MAX_VIGNETTE_ALPHA);
    }

    #[test]
    fn test_radius_shrinks_with_intensity() {
        let r_low = outer_radius(10.0, 400.0, 300.0);
        let r_high = outer_radius(80.0, 400.0, 300.0);
        assert!(r_high < r_low);

        // Half diagonal of 400x300 is 250
        assert!((outer_radius(0.0, 400.0, 300.0) - 300.0).abs() < 1e-9);
        assert!((outer_radius(20.0, 400.0, 300.0) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_radius_floor() {
        assert_eq!(outer_radius(150.0, 400.0, 300.0), MIN_VIGNETTE_RADIUS);
        assert_eq!(outer_radius(200.0, 400.0, 300.0), MIN_VIGNETTE_RADIUS);
    }

    #[test]
    fn test_alpha_profile() {
        let v = Vignette::synthesize(50.0, 200.0, 200.0).unwrap();
        assert_eq!(v.alpha_at(100.0, 100.0), 0.0);

        // Beyond the radius, alpha holds the last stop
        assert!((v.alpha_at(-1000.0, -1000.0) - 0.5).abs() < 1e-6);

        // Halfway along the radius
        let halfway = v.alpha_at(100.0 + v.radius / 2.0, 100.0);
        assert!((halfway - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_composite_darkens_corners_not_center() {
        let mut img = RgbaImage::from_pixel(101, 101, Rgba([200, 200, 200, 255]));
        Vignette::synthesize(100.0, 101.0, 101.0)
            .unwrap()
            .composite(&mut img);

        let center = img.get_pixel(50, 50).0;
        let corner = img.get_pixel(0, 0).0;
        assert_eq!(center, [200, 200, 200, 255]);
        assert!(corner[0] < 100, "corner should be dark, got {:?}", corner);
        assert_eq!(corner[3], 255);
    }

    #[test]
    fn test_composite_max_darkening_respects_cap() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        // Radius floors to 1, so every pixel away from the center gets the cap
        Vignette::synthesize(200.0, 10.0, 10.0)
            .unwrap()
            .composite(&mut img);

        let corner = img.get_pixel(0, 0).0;
        // 255 * (1 - 0.85) = 38.25
        assert_eq!(corner, [38, 38, 38, 255]);
    }

    #[test]
    fn test_composite_over_transparent() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        Vignette::synthesize(200.0, 10.0, 10.0)
            .unwrap()
            .composite(&mut img);

        let corner = img.get_pixel(0, 0).0;
        assert_eq!(corner, [0, 0, 0, 217]);
    }

    #[test]
    fn test_css_gradient() {
        let v = Vignette::synthesize(20.0, 400.0, 300.0).unwrap();
        assert_eq!(
            v.to_css(),
            "radial-gradient(circle 250.00px at 50% 50%, rgba(0, 0, 0, 0) 0%, rgba(0, 0, 0, 0.200) 100%)"
        );
    }
}
