//! Watermark presence detection.
//!
//! The logo is white, so where it is present the luma inside the expected
//! rectangle rises above the surrounding background in proportion to the
//! alpha mask. Two gates must both pass:
//! 1. **Luma delta**: the opacity-weighted brightness excess, with the
//!    corner's generic brightness (measured on clear mask pixels) removed.
//! 2. **Shape correlation**: Pearson correlation between mask opacity and
//!    the per-pixel brightness excess, so bright corners without the logo's
//!    shape are rejected.

use image::{DynamicImage, GenericImageView};

use crate::alpha::AlphaMask;
use crate::error::{Error, Result};
use crate::placement::{Info, Rect, WatermarkConfig};

/// Minimum luma delta (8-bit scale) to consider a watermark present.
pub const LUMA_THRESHOLD: f64 = 6.0;
/// Minimum shape correlation to consider a watermark present.
pub const CORRELATION_THRESHOLD: f64 = 0.20;
/// Mask opacity below which a pixel counts as clear of the logo.
pub const CLEAR_ALPHA_CUTOFF: f64 = 0.02;
/// Lower bound on the width of the background band around the logo.
const MIN_BAND: u32 = 8;

const LUMA_R: f64 = 0.2126;
const LUMA_G: f64 = 0.7152;
const LUMA_B: f64 = 0.0722;

/// Result of watermark detection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Detection {
    /// Whether both the luma and shape gates passed.
    pub present: bool,
    /// Luma delta: opacity-weighted brightness excess over the background.
    pub score: f64,
    /// Shape score: correlation between opacity and brightness excess.
    pub correlation: f64,
    /// Where the watermark is (or would be).
    pub info: Info,
}

/// Luma of the pixel at `(x, y)` on the 8-bit scale.
fn luma_at(image: &DynamicImage, x: u32, y: u32) -> f64 {
    let [r, g, b] = match image {
        DynamicImage::ImageRgb16(buf) => {
            let p = buf.get_pixel(x, y);
            [p[0], p[1], p[2]].map(scale16)
        }
        DynamicImage::ImageRgba16(buf) => {
            let p = buf.get_pixel(x, y);
            [p[0], p[1], p[2]].map(scale16)
        }
        DynamicImage::ImageLuma16(buf) => [scale16(buf.get_pixel(x, y)[0]); 3],
        DynamicImage::ImageLumaA16(buf) => [scale16(buf.get_pixel(x, y)[0]); 3],
        _ => {
            let p = image.get_pixel(x, y);
            [p[0], p[1], p[2]].map(f64::from)
        }
    };
    LUMA_R * r + LUMA_G * g + LUMA_B * b
}

fn scale16(v: u16) -> f64 {
    f64::from(v) / 257.0
}

/// Mean luma over `region`, skipping pixels inside `exclude`.
///
/// Returns the mean and the number of pixels sampled; the mean is 0 when
/// nothing was sampled.
#[must_use]
pub fn mean_luma(image: &DynamicImage, region: Rect, exclude: Option<Rect>) -> (f64, usize) {
    let mut sum = 0.0;
    let mut count = 0usize;

    for y in region.min_y..region.max_y {
        for x in region.min_x..region.max_x {
            if exclude.is_some_and(|r| r.contains(x, y)) {
                continue;
            }
            sum += luma_at(image, x, y);
            count += 1;
        }
    }

    if count == 0 {
        return (0.0, 0);
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / count as f64;
    (mean, count)
}

/// Pearson correlation between two equal-length series.
///
/// Zero (or rounding-level) variance in either series yields 0.
#[must_use]
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = a.len() as f64;

    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denom_a = 0.0;
    let mut denom_b = 0.0;

    for (va, vb) in a.iter().zip(b) {
        let da = va - mean_a;
        let db = vb - mean_b;
        numerator += da * db;
        denom_a += da * da;
        denom_b += db * db;
    }

    let denom = (denom_a * denom_b).sqrt();
    if denom < 1e-10 {
        0.0
    } else {
        numerator / denom
    }
}

/// Score the pixels in `rect` against the alpha mask.
///
/// Returns `(delta, correlation)`: the luma delta and the shape score.
///
/// # Errors
///
/// - [`Error::SizeMismatch`] if the mask does not cover `rect` exactly
/// - [`Error::InsufficientPixels`] if the mask has no clear pixels
/// - [`Error::NoOpaqueSignal`] if the mask has no opacity at all
pub fn score_watermark(
    image: &DynamicImage,
    rect: Rect,
    mask: &AlphaMask,
    background_mean: f64,
) -> Result<(f64, f64)> {
    let required = rect.area();
    if required == 0 {
        return Err(Error::InsufficientPixels("empty watermark rectangle"));
    }
    if mask.len() != required {
        return Err(Error::SizeMismatch {
            have: mask.len(),
            want: required,
        });
    }
    let (width, height) = image.dimensions();
    if !rect.fits_within(width, height) {
        return Err(Error::OutOfBounds {
            rect,
            width,
            height,
        });
    }

    let mut residuals = Vec::with_capacity(required);
    for y in rect.min_y..rect.max_y {
        for x in rect.min_x..rect.max_x {
            residuals.push(luma_at(image, x, y) - background_mean);
        }
    }
    let alphas: Vec<f64> = mask.values().iter().copied().map(f64::from).collect();

    let mut clear_sum = 0.0;
    let mut clear_count = 0usize;
    let mut weighted = 0.0;
    let mut alpha_sum = 0.0;
    for (&residual, &alpha) in residuals.iter().zip(&alphas) {
        if alpha < CLEAR_ALPHA_CUTOFF {
            clear_sum += residual;
            clear_count += 1;
        }
        weighted += residual * alpha;
        alpha_sum += alpha;
    }

    if clear_count == 0 {
        return Err(Error::InsufficientPixels("alpha map missing clear pixels"));
    }
    if alpha_sum == 0.0 {
        return Err(Error::NoOpaqueSignal);
    }

    #[allow(clippy::cast_precision_loss)]
    let clear_mean = clear_sum / clear_count as f64;
    let delta = weighted / alpha_sum - clear_mean;
    let correlation = pearson(&alphas, &residuals);

    Ok((delta, correlation))
}

/// Detect whether the watermark is present at `rect`.
///
/// The background is estimated from a band of `max(logo_size / 3, 8)`
/// pixels around the rectangle, clipped to the image.
///
/// # Errors
///
/// Returns [`Error::InsufficientPixels`] if the rectangle or the band is
/// empty, plus any error from [`score_watermark`].
pub fn detect_watermark(
    image: &DynamicImage,
    config: WatermarkConfig,
    rect: Rect,
    mask: &AlphaMask,
) -> Result<Detection> {
    let (width, height) = image.dimensions();
    let band = (config.logo_size / 3).max(MIN_BAND);
    let outer = rect.expand_within(band, width, height);

    let inner_count = if rect.fits_within(width, height) {
        rect.area()
    } else {
        0
    };
    let (background_mean, outer_count) = mean_luma(image, outer, Some(rect));
    if inner_count == 0 || outer_count == 0 {
        return Err(Error::InsufficientPixels("empty watermark region or background band"));
    }

    let (score, correlation) = score_watermark(image, rect, mask, background_mean)?;
    let present = score > LUMA_THRESHOLD && correlation > CORRELATION_THRESHOLD;

    tracing::debug!(
        size = config.logo_size,
        %rect,
        background_mean,
        score,
        correlation,
        present,
        "scored watermark region"
    );

    Ok(Detection {
        present,
        score,
        correlation,
        info: Info {
            size: config.logo_size,
            position: rect,
        },
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::placement::resolve_rect;
    use crate::test_support;

    fn diamond_mask(size: u32) -> AlphaMask {
        let values: Vec<f32> = (0..size * size)
            .map(|i| test_support::diamond_alpha(size, i % size, i / size))
            .collect();
        AlphaMask::from_values(size, size, values)
    }

    fn detect_on(img: RgbaImage, mask: &AlphaMask) -> Detection {
        let (w, h) = img.dimensions();
        let cfg = WatermarkConfig::SMALL;
        let rect = resolve_rect(w, h, cfg).unwrap();
        detect_watermark(&DynamicImage::ImageRgba8(img), cfg, rect, mask).unwrap()
    }

    #[test]
    fn pearson_returns_one_for_perfect_match() {
        let a = [0.1, 0.5, 0.9, 0.3, 0.7];
        assert!((pearson(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_returns_negative_one_for_inverse() {
        let a = [0.1, 0.5, 0.9, 0.3, 0.7];
        let b = a.map(|v| 1.0 - v);
        assert!((pearson(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_constant_series_is_zero() {
        assert_eq!(pearson(&[0.5; 8], &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]), 0.0);
        assert_eq!(pearson(&[], &[]), 0.0);
    }

    #[test]
    fn mean_luma_excludes_inner_rect() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let img = DynamicImage::ImageRgba8(img);
        let all = Rect::new(0, 0, 4, 4);

        let (mean, count) = mean_luma(&img, all, Some(Rect::new(1, 1, 2, 2)));
        assert_eq!(count, 15);
        assert!((mean - 100.0).abs() < 1e-9);

        let (_, count) = mean_luma(&img, all, None);
        assert_eq!(count, 16);
    }

    #[test]
    fn luma_of_16_bit_pixels_is_on_8_bit_scale() {
        let img = image::ImageBuffer::from_pixel(1, 1, image::Rgb([65535u16, 65535, 65535]));
        let img = DynamicImage::ImageRgb16(img);
        let (mean, _) = mean_luma(&img, Rect::new(0, 0, 1, 1), None);
        assert!((mean - 255.0).abs() < 1e-9);
    }

    #[test]
    fn composited_logo_is_present() {
        let mask = diamond_mask(48);
        let mut img = test_support::gradient(300, 200);
        let rect = resolve_rect(300, 200, WatermarkConfig::SMALL).unwrap();
        test_support::composite(&mut img, mask.values(), 48, rect.min_x, rect.min_y);

        let det = detect_on(img, &mask);
        assert!(det.present, "score={} corr={}", det.score, det.correlation);
        assert!(det.score > LUMA_THRESHOLD);
        assert!(det.correlation > 0.5);
        assert_eq!(det.info, Info { size: 48, position: rect });
    }

    #[test]
    fn clean_image_is_absent() {
        let det = detect_on(test_support::gradient(300, 200), &diamond_mask(48));
        assert!(!det.present);
        assert!(det.score.abs() < LUMA_THRESHOLD);
        assert_eq!(det.info.size, 48);
    }

    #[test]
    fn bright_corner_without_logo_shape_is_absent() {
        let mut img = RgbaImage::from_pixel(300, 200, Rgba([40, 40, 40, 255]));
        let rect = resolve_rect(300, 200, WatermarkConfig::SMALL).unwrap();
        for y in rect.min_y..rect.max_y {
            for x in rect.min_x..rect.max_x {
                img.put_pixel(x, y, Rgba([250, 250, 250, 255]));
            }
        }
        let det = detect_on(img, &diamond_mask(48));
        assert!(!det.present);
        assert!(det.score.abs() < 1e-6);
    }

    #[test]
    fn faint_logo_fails_the_luma_gate() {
        let faint: Vec<f32> = diamond_mask(48).values().iter().map(|a| a * 0.02).collect();
        let mut img = RgbaImage::from_pixel(300, 200, Rgba([60, 60, 60, 255]));
        let rect = resolve_rect(300, 200, WatermarkConfig::SMALL).unwrap();
        test_support::composite(&mut img, &faint, 48, rect.min_x, rect.min_y);

        let det = detect_on(img, &diamond_mask(48));
        assert!(!det.present);
        assert!(det.score < LUMA_THRESHOLD);
    }

    #[test]
    fn degenerate_masks_are_errors() {
        let img = DynamicImage::ImageRgba8(test_support::gradient(100, 100));
        let rect = Rect::new(10, 10, 14, 14);

        let opaque = AlphaMask::from_values(4, 4, vec![0.5_f32; 16]);
        assert!(matches!(
            score_watermark(&img, rect, &opaque, 0.0),
            Err(Error::InsufficientPixels(_))
        ));

        let empty = AlphaMask::from_values(4, 4, vec![0.0_f32; 16]);
        assert!(matches!(
            score_watermark(&img, rect, &empty, 0.0),
            Err(Error::NoOpaqueSignal)
        ));

        let short = AlphaMask::from_values(4, 4, vec![0.0_f32; 9]);
        assert!(matches!(
            score_watermark(&img, rect, &short, 0.0),
            Err(Error::SizeMismatch { have: 9, want: 16 })
        ));
    }
}
