//! Detect and remove the visible Gemini watermark via reverse alpha blending.
//!
//! Gemini composites a semi-transparent white sparkle logo into the
//! bottom-right corner of generated images. This crate estimates the logo's
//! per-pixel opacity from reference captures (48x48 and 96x96), checks
//! whether the logo is actually there, and inverts the blend to recover the
//! original pixels.
//!
//! # Quick Start
//!
//! ```no_run
//! use gwatermark::WatermarkEngine;
//!
//! let engine = WatermarkEngine::new();
//! let img = image::open("photo.png").unwrap();
//! let detection = engine.detect(&img).unwrap();
//! if detection.present {
//!     let cleaned = engine.remove(&img).unwrap();
//!     cleaned.save("cleaned.png").unwrap();
//! }
//! ```
//!
//! # Detection
//!
//! A watermark counts as present only if the opacity-weighted brightness
//! excess over the surrounding background is large enough **and** that excess
//! correlates with the logo's shape. Images without the mark are left alone by
//! the byte and file entry points.
//!
//! ```no_run
//! let data = std::fs::read("photo.jpg").unwrap();
//! let cleaned = gwatermark::remove_watermark_bytes(&data).unwrap();
//! match cleaned.output {
//!     Some(png) => std::fs::write("photo_unwatermarked.png", png).unwrap(),
//!     None => println!("no watermark (score {:.2})", cleaned.detection.score),
//! }
//! ```
//!
//! # Reference captures
//!
//! The captures `bg_48.png` and `bg_96.png` are read through an
//! [`AssetStore`]. [`WatermarkEngine::new`] reads them from
//! `$GWATERMARK_ASSETS`, falling back to the crate's `assets/` directory;
//! [`WatermarkEngine::with_store`] accepts any other store.

#![deny(missing_docs)]

pub mod alpha;
pub mod assets;
pub mod blending;
pub mod codec;
pub mod detection;
mod engine;
pub mod error;
pub mod placement;

#[cfg(test)]
mod test_support;

use image::{DynamicImage, RgbaImage};

pub use alpha::{AlphaMask, AlphaMaskCache};
pub use assets::{AssetStore, DirAssetStore, MemoryAssetStore};
pub use codec::{default_output_path, is_supported_image, save_image};
pub use detection::Detection;
pub use engine::{
    Cleaned, CleanedBase64, ProcessOptions, ProcessResult, WatermarkEngine,
};
pub use error::{Error, Result};
pub use placement::{watermark_info, Info, Rect, WatermarkConfig, WatermarkSize};

/// Detect the watermark using [`WatermarkEngine::shared`].
///
/// # Errors
///
/// See [`WatermarkEngine::detect`].
pub fn detect_watermark(image: &DynamicImage) -> Result<Detection> {
    WatermarkEngine::shared().detect(image)
}

/// Remove the watermark using [`WatermarkEngine::shared`].
///
/// # Errors
///
/// See [`WatermarkEngine::remove`].
pub fn remove_watermark(image: &DynamicImage) -> Result<RgbaImage> {
    WatermarkEngine::shared().remove(image)
}

/// Detect the watermark in encoded bytes using [`WatermarkEngine::shared`].
///
/// # Errors
///
/// See [`WatermarkEngine::detect_bytes`].
pub fn detect_watermark_bytes(data: &[u8]) -> Result<Detection> {
    WatermarkEngine::shared().detect_bytes(data)
}

/// Detect and remove the watermark from encoded bytes using
/// [`WatermarkEngine::shared`].
///
/// # Errors
///
/// See [`WatermarkEngine::remove_bytes`].
pub fn remove_watermark_bytes(data: &[u8]) -> Result<Cleaned> {
    WatermarkEngine::shared().remove_bytes(data)
}

/// Detect and remove the watermark from base64 text using
/// [`WatermarkEngine::shared`].
///
/// # Errors
///
/// See [`WatermarkEngine::remove_base64`].
pub fn remove_watermark_base64(input: &str) -> Result<CleanedBase64> {
    WatermarkEngine::shared().remove_base64(input)
}
