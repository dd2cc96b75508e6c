//! WASM-compatible wrapper types for image data.
//!
//! Pixels cross the boundary as straight RGBA8 (4 bytes per pixel, row-major),
//! the same layout as canvas `ImageData`.

use image::RgbaImage;
use visioncut_core::ImageHandle;
use wasm_bindgen::prelude::*;

/// An RGBA image for JavaScript.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy is made
/// to JavaScript memory as a `Uint8Array`. The `free()` method can be called to
/// release WASM memory early; otherwise wasm-bindgen's finalizer handles cleanup.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

impl JsImage {
    pub(crate) fn from_rgba(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }

    /// Copy the natural-size raster out of a handle.
    pub(crate) fn from_handle(handle: &ImageHandle) -> Self {
        Self::from_rgba(handle.raster().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use visioncut_core::DisplaySize;

    #[test]
    fn test_js_image_from_rgba() {
        let img = JsImage::from_rgba(RgbaImage::from_pixel(10, 5, Rgba([1, 2, 3, 4])));
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 5);
        assert_eq!(img.byte_length(), 200);
        assert_eq!(&img.pixels()[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_js_image_from_handle_keeps_natural_size() {
        let handle = ImageHandle::new(
            RgbaImage::new(40, 30),
            DisplaySize::new(4.0, 3.0),
        )
        .unwrap();
        let img = JsImage::from_handle(&handle);
        assert_eq!((img.width(), img.height()), (40, 30));
    }
}
