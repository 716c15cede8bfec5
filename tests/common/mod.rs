#![allow(dead_code)]

use std::io::Cursor;

use gwatermark::{MemoryAssetStore, WatermarkEngine};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

/// Opacity of a diamond-shaped logo peaking at 0.45 in the tile center.
#[allow(clippy::cast_precision_loss)]
pub fn diamond_alpha(size: u32, x: u32, y: u32) -> f32 {
    let c = (size as f32 - 1.0) / 2.0;
    let r = size as f32 * 0.45;
    let d = ((x as f32 - c).abs() + (y as f32 - c).abs()) / r;
    if d < 1.0 {
        0.45 * (1.0 - d)
    } else {
        0.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn capture_png(size: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(size, size, |x, y| {
        let v = (diamond_alpha(size, x, y) * 255.0).round() as u8;
        Rgb([v, v, v])
    });
    encode(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

pub fn engine() -> WatermarkEngine {
    WatermarkEngine::with_store(
        MemoryAssetStore::new()
            .with_asset(48, capture_png(48))
            .with_asset(96, capture_png(96)),
    )
}

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

/// `gradient` with the logo forward-blended at its expected position.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn watermarked(engine: &WatermarkEngine, width: u32, height: u32) -> RgbaImage {
    let mut img = gradient(width, height);
    let info = gwatermark::watermark_info(width, height).unwrap();
    let mask = engine.mask(info.size).unwrap();
    let rect = info.position;

    for (i, &a) in mask.values().iter().enumerate() {
        let i = i as u32;
        let px = img.get_pixel_mut(rect.min_x + i % info.size, rect.min_y + i / info.size);
        for ch in 0..3 {
            let blended = a * 255.0 + (1.0 - a) * f32::from(px[ch]);
            px[ch] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    img
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}
