//! Watermark placement: which logo preset applies and where it sits.

use std::fmt;

use crate::error::{Error, Result};

/// Watermark size classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatermarkSize {
    /// 48x48 watermark, 32px margin (images where either dimension <= 1024).
    Small,
    /// 96x96 watermark, 64px margin (images where both dimensions > 1024).
    Large,
}

impl WatermarkSize {
    /// Determine watermark size based on image dimensions.
    ///
    /// - **Large**: both width AND height > 1024
    /// - **Small**: otherwise (including 1024x1024)
    #[must_use]
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width > 1024 && height > 1024 {
            Self::Large
        } else {
            Self::Small
        }
    }

    /// The placement preset for this size.
    #[must_use]
    pub const fn config(self) -> WatermarkConfig {
        match self {
            Self::Small => WatermarkConfig::SMALL,
            Self::Large => WatermarkConfig::LARGE,
        }
    }
}

/// Logo size and margins of a watermark preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkConfig {
    /// Edge length of the square logo in pixels.
    pub logo_size: u32,
    /// Gap between the logo and the right image edge.
    pub margin_right: u32,
    /// Gap between the logo and the bottom image edge.
    pub margin_bottom: u32,
}

impl WatermarkConfig {
    /// 48x48 logo inset 32px from the bottom-right corner.
    pub const SMALL: Self = Self {
        logo_size: 48,
        margin_right: 32,
        margin_bottom: 32,
    };

    /// 96x96 logo inset 64px from the bottom-right corner.
    pub const LARGE: Self = Self {
        logo_size: 96,
        margin_right: 64,
        margin_bottom: 64,
    };
}

/// Axis-aligned pixel rectangle, half-open: `[min_x, max_x) x [min_y, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub min_x: u32,
    /// Top edge (inclusive).
    pub min_y: u32,
    /// Right edge (exclusive).
    pub max_x: u32,
    /// Bottom edge (exclusive).
    pub max_y: u32,
}

impl Rect {
    /// Build a rectangle from its corners.
    #[must_use]
    pub const fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Number of pixels covered.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Whether `(x, y)` lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Whether the rectangle fits inside a `width` x `height` image.
    #[must_use]
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.min_x <= self.max_x
            && self.min_y <= self.max_y
            && self.max_x <= width
            && self.max_y <= height
    }

    /// Grow by `band` on every side, clipped to a `width` x `height` image.
    #[must_use]
    pub fn expand_within(&self, band: u32, width: u32, height: u32) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(band),
            min_y: self.min_y.saturating_sub(band),
            max_x: self.max_x.saturating_add(band).min(width),
            max_y: self.max_y.saturating_add(band).min(height),
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Watermark size and placement, reported for display and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Info {
    /// Logo edge length in pixels.
    pub size: u32,
    /// Where the logo sits in the image.
    pub position: Rect,
}

/// Select the watermark preset for an image of the given dimensions.
#[must_use]
pub fn resolve_config(width: u32, height: u32) -> WatermarkConfig {
    WatermarkSize::for_dimensions(width, height).config()
}

/// Compute the watermark rectangle inside a `width` x `height` image.
///
/// # Errors
///
/// Returns [`Error::OutOfBounds`] when the logo plus its margins does not fit.
pub fn resolve_rect(width: u32, height: u32, config: WatermarkConfig) -> Result<Rect> {
    let size = i64::from(config.logo_size);
    let x = i64::from(width) - i64::from(config.margin_right) - size;
    let y = i64::from(height) - i64::from(config.margin_bottom) - size;

    match (u32::try_from(x), u32::try_from(y)) {
        (Ok(x), Ok(y)) => {
            let rect = Rect::new(x, y, x + config.logo_size, y + config.logo_size);
            if rect.fits_within(width, height) {
                return Ok(rect);
            }
            Err(Error::OutOfBounds {
                rect,
                width,
                height,
            })
        }
        _ => Err(Error::OutOfBounds {
            rect: Rect::new(
                clamp_to_u32(x),
                clamp_to_u32(y),
                clamp_to_u32(x + size),
                clamp_to_u32(y + size),
            ),
            width,
            height,
        }),
    }
}

/// Preset and rectangle for an image, without touching any pixels.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for zero dimensions and
/// [`Error::OutOfBounds`] when the image is too small for its preset.
pub fn watermark_info(width: u32, height: u32) -> Result<Info> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "invalid image dimensions {width}x{height}"
        )));
    }
    let config = resolve_config(width, height);
    let position = resolve_rect(width, height, config)?;
    Ok(Info {
        size: config.logo_size,
        position,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_to_u32(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_preset_when_either_dim_lte_1024() {
        assert_eq!(resolve_config(800, 600), WatermarkConfig::SMALL);
        assert_eq!(resolve_config(1024, 1024), WatermarkConfig::SMALL);
        assert_eq!(resolve_config(1024, 1025), WatermarkConfig::SMALL);
        assert_eq!(resolve_config(2048, 512), WatermarkConfig::SMALL);
        assert_eq!(resolve_config(512, 2048), WatermarkConfig::SMALL);
    }

    #[test]
    fn large_preset_when_both_dims_gt_1024() {
        assert_eq!(resolve_config(1025, 1025), WatermarkConfig::LARGE);
        assert_eq!(resolve_config(4096, 2048), WatermarkConfig::LARGE);
    }

    #[test]
    fn rect_is_inset_from_bottom_right_by_margins() {
        for (w, h) in [(200, 150), (1024, 1024), (1025, 2000), (4000, 3000)] {
            let cfg = resolve_config(w, h);
            let rect = resolve_rect(w, h, cfg).unwrap();
            assert_eq!(w - rect.max_x, cfg.margin_right);
            assert_eq!(h - rect.max_y, cfg.margin_bottom);
            assert_eq!(rect.width(), cfg.logo_size);
            assert_eq!(rect.height(), cfg.logo_size);
        }
    }

    #[test]
    fn rect_for_exact_minimum_image_starts_at_origin() {
        let rect = resolve_rect(80, 80, WatermarkConfig::SMALL).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 48, 48));
    }

    #[test]
    fn rect_fails_when_image_too_small() {
        let err = resolve_rect(79, 200, WatermarkConfig::SMALL).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { width: 79, .. }));
        assert!(resolve_rect(200, 10, WatermarkConfig::SMALL).is_err());
    }

    #[test]
    fn watermark_info_rejects_zero_dimensions() {
        assert!(matches!(
            watermark_info(0, 100),
            Err(Error::InvalidInput(_))
        ));
        let info = watermark_info(1600, 1200).unwrap();
        assert_eq!(info.size, 96);
        assert_eq!(info.position, Rect::new(1440, 1040, 1536, 1136));
    }

    #[test]
    fn expand_within_clips_to_image() {
        let rect = Rect::new(0, 0, 48, 48);
        let outer = rect.expand_within(16, 60, 100);
        assert_eq!(outer, Rect::new(0, 0, 60, 64));
        assert!(outer.contains(59, 63));
        assert!(!outer.contains(60, 0));
    }
}
