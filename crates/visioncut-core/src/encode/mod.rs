//! Image encoding for VisionCut exports.
//!
//! Exports are lossless PNG so the downloaded file carries exactly the pixels
//! the compositor produced, including transparency left by background
//! removal.
//!
//! # Examples
//!
//! ```ignore
//! use visioncut_core::encode::{encode_png, PngCompression};
//!
//! let pixels = vec![128u8; 100 * 100 * 4]; // Gray image
//! let png = encode_png(&pixels, 100, 100, PngCompression::Best).unwrap();
//! println!("Encoded {} bytes", png.len());
//! ```

mod png;

pub use png::{encode_png, encode_rgba_image, EncodeError, PngCompression, PNG_SIGNATURE};
