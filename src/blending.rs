//! Alpha blending math for watermark removal.
//!
//! Gemini applies watermarks via forward alpha blending of a white logo:
//! `watermarked = alpha * 255 + (1 - alpha) * original`
//!
//! This module provides the reverse operation to recover original pixels.

use image::RgbaImage;

use crate::alpha::AlphaMask;
use crate::error::{Error, Result};
use crate::placement::Rect;

/// Alpha threshold: ignore pixels with negligible watermark effect (noise).
pub const ALPHA_THRESHOLD: f64 = 0.002;

/// Maximum alpha: clamp to avoid division by near-zero in reverse blending.
pub const MAX_ALPHA: f64 = 0.99;

/// Channel value of the logo (white).
pub const LOGO_VALUE: f64 = 255.0;

/// Remove the watermark inside `rect` using reverse alpha blending.
///
/// Applies `original = (watermarked - alpha * 255) / (1 - alpha)` to the RGB
/// channels of every pixel whose opacity reaches [`ALPHA_THRESHOLD`], with
/// opacity capped at [`MAX_ALPHA`]. Alpha and everything outside `rect` are
/// left unchanged.
///
/// # Errors
///
/// Returns [`Error::SizeMismatch`] if the mask does not have exactly one
/// entry per rectangle pixel, or [`Error::OutOfBounds`] if `rect` does not fit
/// in `image`. The image is untouched on error.
pub fn reverse_alpha_blend(image: &mut RgbaImage, mask: &AlphaMask, rect: Rect) -> Result<()> {
    let want = rect.area();
    if mask.len() != want {
        return Err(Error::SizeMismatch {
            have: mask.len(),
            want,
        });
    }
    if !rect.fits_within(image.width(), image.height()) {
        return Err(Error::OutOfBounds {
            rect,
            width: image.width(),
            height: image.height(),
        });
    }

    let stride = rect.width() as usize;
    if stride == 0 {
        return Ok(());
    }
    for (row, alphas) in mask.values().chunks_exact(stride).enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let y = rect.min_y + row as u32;
        for (col, &alpha) in alphas.iter().enumerate() {
            let alpha = f64::from(alpha);
            if alpha < ALPHA_THRESHOLD {
                continue;
            }
            let alpha = alpha.min(MAX_ALPHA);
            let inv_alpha = 1.0 - alpha;

            #[allow(clippy::cast_possible_truncation)]
            let px = image.get_pixel_mut(rect.min_x + col as u32, y);
            for ch in 0..3 {
                let watermarked = f64::from(px[ch]);
                let original = (watermarked - alpha * LOGO_VALUE) / inv_alpha;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    px[ch] = original.clamp(0.0, 255.0).round() as u8;
                }
            }
        }
    }

    Ok(())
}
