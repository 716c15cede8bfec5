//! Synthetic captures and images shared by unit tests.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use crate::assets::MemoryAssetStore;

/// Peak opacity of the synthetic logo.
pub const PEAK_ALPHA: f32 = 0.45;

/// Opacity of a diamond-shaped logo at `(x, y)` in a `size` x `size` tile.
#[allow(clippy::cast_precision_loss)]
pub fn diamond_alpha(size: u32, x: u32, y: u32) -> f32 {
    let c = (size as f32 - 1.0) / 2.0;
    let r = size as f32 * 0.45;
    let d = ((x as f32 - c).abs() + (y as f32 - c).abs()) / r;
    if d < 1.0 {
        PEAK_ALPHA * (1.0 - d)
    } else {
        0.0
    }
}

/// PNG capture of the diamond logo on black.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn capture_png(size: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(size, size, |x, y| {
        let v = (diamond_alpha(size, x, y) * 255.0).round() as u8;
        Rgb([v, v, v])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Store with synthetic 48 and 96 captures.
pub fn synthetic_store() -> MemoryAssetStore {
    MemoryAssetStore::new()
        .with_asset(48, capture_png(48))
        .with_asset(96, capture_png(96))
}

/// A smooth, mid-grey linear gradient with an opaque alpha channel.
#[allow(clippy::cast_possible_truncation)]
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (60 + x * 60 / width) as u8,
            (70 + y * 50 / height) as u8,
            (90 + (x + y) * 40 / (width + height)) as u8,
            255,
        ])
    })
}

/// Forward-composite a white logo with `alpha` over `img` at `(x0, y0)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn composite(img: &mut RgbaImage, alpha: &[f32], size: u32, x0: u32, y0: u32) {
    for dy in 0..size {
        for dx in 0..size {
            let a = alpha[(dy * size + dx) as usize];
            let px = img.get_pixel_mut(x0 + dx, y0 + dy);
            for ch in 0..3 {
                let blended = a * 255.0 + (1.0 - a) * f32::from(px[ch]);
                px[ch] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
