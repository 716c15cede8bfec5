//! Image decoding and encoding, including base64 and data-URL payloads.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{Error, Result};

/// Decode image bytes, detecting the format from the content.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for empty input and [`Error::Decode`] if
/// the format is unknown or the data is corrupt.
pub fn decode_image_bytes(data: &[u8]) -> Result<(DynamicImage, ImageFormat)> {
    if data.is_empty() {
        return Err(Error::InvalidInput("empty image data".to_string()));
    }

    let format = image::guess_format(data).map_err(Error::decode)?;
    let img = image::load_from_memory_with_format(data, format).map_err(Error::decode)?;
    Ok((img, format))
}

/// Decode a base64 image, optionally wrapped in a `data:` URL.
///
/// # Errors
///
/// Returns [`Error::Base64`] for malformed base64, or any error from
/// [`decode_image_bytes`].
pub fn decode_base64_image(input: &str) -> Result<(DynamicImage, ImageFormat)> {
    decode_image_bytes(&decode_base64_payload(input)?)
}

/// Strip an optional data-URL prefix and decode the base64 payload.
///
/// # Errors
///
/// Returns [`Error::Base64`] for malformed base64.
pub fn decode_base64_payload(input: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(strip_data_prefix(input.trim()))?)
}

/// Return the payload of a `data:<mime>;base64,<payload>` URL, or the input
/// unchanged if it is not a data URL.
#[must_use]
pub fn strip_data_prefix(input: &str) -> &str {
    let is_data_url = input
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"));
    if is_data_url {
        if let Some(idx) = input.find(',') {
            return &input[idx + 1..];
        }
    }
    input
}

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns [`Error::Encode`] if encoding fails.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(Error::encode)?;
    Ok(out.into_inner())
}

/// Encode an image as PNG and return standard base64 text.
///
/// # Errors
///
/// Returns [`Error::Encode`] if encoding fails.
pub fn encode_png_base64(img: &RgbaImage) -> Result<String> {
    Ok(encode_base64(&encode_png(img)?))
}

/// Standard base64 text for `bytes`.
#[must_use]
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Save an image, choosing the encoder from the file extension.
///
/// JPEG is written at quality 100. JPEG and BMP drop the alpha channel.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&rgb).map_err(Error::encode)?;
        }
        ImageFormat::Bmp => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            rgb.save_with_format(path, format).map_err(Error::encode)?;
        }
        ImageFormat::Png | ImageFormat::WebP => {
            img.save_with_format(path, format).map_err(Error::encode)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_unwatermarked.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_unwatermarked.png"))
}
