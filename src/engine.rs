//! Core watermark removal engine.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::alpha::{AlphaMask, AlphaMaskCache};
use crate::assets::{AssetStore, DirAssetStore};
use crate::blending;
use crate::codec;
use crate::detection::{self, Detection};
use crate::error::Result;
use crate::placement::{self, Info, Rect, WatermarkConfig};

/// Options controlling file and directory processing.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Skip watermark detection, process unconditionally.
    pub force: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (no watermark detected).
    pub skipped: bool,
    /// Detection luma score, 0 when detection did not run.
    pub score: f64,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            score: 0.0,
            message: String::new(),
        }
    }
}

/// Output of byte-level removal.
#[derive(Debug, Clone)]
pub struct Cleaned {
    /// Cleaned image as PNG, `None` when no watermark was detected.
    pub output: Option<Vec<u8>>,
    /// The detection that decided whether to clean.
    pub detection: Detection,
}

/// Output of base64-level removal.
#[derive(Debug, Clone)]
pub struct CleanedBase64 {
    /// Cleaned image as base64 PNG, `None` when no watermark was detected.
    pub output: Option<String>,
    /// The detection that decided whether to clean.
    pub detection: Detection,
}

/// The watermark engine holding the alpha mask cache.
///
/// Create once and reuse for many images; masks are loaded on first use and
/// shared by every later call, including concurrent ones.
#[derive(Debug)]
pub struct WatermarkEngine {
    masks: AlphaMaskCache,
}

impl Default for WatermarkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WatermarkEngine {
    /// Create an engine reading captures from [`DirAssetStore::from_env`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(DirAssetStore::from_env())
    }

    /// Create an engine with its own mask cache over `store`.
    pub fn with_store(store: impl AssetStore + 'static) -> Self {
        Self {
            masks: AlphaMaskCache::new(Arc::new(store)),
        }
    }

    /// Process-wide engine behind the free functions of this crate.
    ///
    /// Built on first use and kept until the process exits. Callers that need
    /// isolated caches should construct their own engine instead.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<WatermarkEngine> = OnceLock::new();
        SHARED.get_or_init(Self::new)
    }

    /// The alpha mask for a logo size.
    ///
    /// # Errors
    ///
    /// See [`AlphaMaskCache::get`].
    pub fn mask(&self, size: u32) -> Result<AlphaMask> {
        self.masks.get(size)
    }

    fn placement(width: u32, height: u32) -> Result<(WatermarkConfig, Rect)> {
        let info = placement::watermark_info(width, height)?;
        let config = placement::resolve_config(width, height);
        Ok((config, info.position))
    }

    /// Detect the watermark in a decoded image.
    ///
    /// A missing watermark is `Ok` with `present == false`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`](crate::Error::InvalidInput) or
    /// [`OutOfBounds`](crate::Error::OutOfBounds) when the image cannot hold
    /// a watermark, mask load errors, and the degenerate input errors of
    /// [`detection::detect_watermark`].
    pub fn detect(&self, image: &DynamicImage) -> Result<Detection> {
        let (width, height) = image.dimensions();
        let (config, rect) = Self::placement(width, height)?;
        let mask = self.mask(config.logo_size)?;
        detection::detect_watermark(image, config, rect, &mask)
    }

    /// Remove the watermark from a decoded image, returning a cleaned copy.
    ///
    /// Runs unconditionally; call [`detect`](Self::detect) first to avoid
    /// altering images without a watermark.
    ///
    /// # Errors
    ///
    /// Returns placement errors, mask load errors, or
    /// [`SizeMismatch`](crate::Error::SizeMismatch) if the mask does not
    /// match the logo size.
    pub fn remove(&self, image: &DynamicImage) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        let (config, rect) = Self::placement(width, height)?;
        let mask = self.mask(config.logo_size)?;

        let mut cleaned = image.to_rgba8();
        blending::reverse_alpha_blend(&mut cleaned, &mask, rect)?;
        Ok(cleaned)
    }

    /// Remove the watermark from an image the caller is willing to have
    /// mutated. The image is untouched if an error is returned.
    ///
    /// # Errors
    ///
    /// Same as [`remove`](Self::remove).
    pub fn remove_in_place(&self, image: &mut RgbaImage) -> Result<Info> {
        let (config, rect) = Self::placement(image.width(), image.height())?;
        let mask = self.mask(config.logo_size)?;
        blending::reverse_alpha_blend(image, &mask, rect)?;
        Ok(Info {
            size: config.logo_size,
            position: rect,
        })
    }

    /// Detect the watermark in encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns decode errors plus everything [`detect`](Self::detect) returns.
    pub fn detect_bytes(&self, data: &[u8]) -> Result<Detection> {
        let (image, _) = codec::decode_image_bytes(data)?;
        self.detect(&image)
    }

    /// Detect and, if present, remove the watermark from encoded bytes.
    ///
    /// The cleaned image is always PNG. When no watermark is detected the
    /// output is `None` and nothing is encoded.
    ///
    /// # Errors
    ///
    /// Returns decode, detection, removal, or encode errors.
    pub fn remove_bytes(&self, data: &[u8]) -> Result<Cleaned> {
        let (image, format) = codec::decode_image_bytes(data)?;
        let detection = self.detect(&image)?;
        if !detection.present {
            tracing::debug!(?format, score = detection.score, "no watermark, leaving image as is");
            return Ok(Cleaned {
                output: None,
                detection,
            });
        }

        let cleaned = self.remove(&image)?;
        Ok(Cleaned {
            output: Some(codec::encode_png(&cleaned)?),
            detection,
        })
    }

    /// Like [`remove_bytes`](Self::remove_bytes) for base64 text, optionally
    /// a `data:` URL. The output is base64 PNG without a data-URL prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Base64`](crate::Error::Base64) plus everything
    /// [`remove_bytes`](Self::remove_bytes) returns.
    pub fn remove_base64(&self, input: &str) -> Result<CleanedBase64> {
        let data = codec::decode_base64_payload(input)?;
        let Cleaned { output, detection } = self.remove_bytes(&data)?;
        Ok(CleanedBase64 {
            output: output.map(|png| codec::encode_base64(&png)),
            detection,
        })
    }

    /// Process a single image file: load, detect, remove, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let data = match std::fs::read(input) {
            Ok(data) => data,
            Err(e) => {
                result.message = format!("Failed to read: {e}");
                return result;
            }
        };
        let image = match codec::decode_image_bytes(&data) {
            Ok((image, _)) => image,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let (w, h) = image.dimensions();
        if let Err(e) = Self::placement(w, h) {
            result.skipped = true;
            result.success = true;
            result.message = format!("Image too small ({w}x{h}): {e}");
            return result;
        }

        if !opts.force {
            match self.detect(&image) {
                Ok(detection) => {
                    result.score = detection.score;
                    if !detection.present {
                        result.skipped = true;
                        result.success = true;
                        result.message = format!(
                            "No watermark detected (score {:.2}, correlation {:.2})",
                            detection.score, detection.correlation
                        );
                        return result;
                    }
                }
                Err(e) => {
                    result.message = format!("Detection failed: {e}");
                    return result;
                }
            }
        }

        let cleaned = match self.remove(&image) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                result.message = format!("Removal failed: {e}");
                return result;
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match codec::save_image(&cleaned, output) {
            Ok(()) => {
                result.success = true;
                result.message = format!("Watermark removed -> {}", output.display());
                tracing::info!(input = %input.display(), output = %output.display(), "watermark removed");
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Outputs keep their file names under `output_dir`. Uses parallel
    /// iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_ok_and(|ft| ft.is_file()))
                .map(|e| e.path())
                .filter(|p| codec::is_supported_image(p))
                .collect(),
            Err(e) => {
                let mut failed = ProcessResult::new(input_dir);
                failed.message = format!("Failed to read directory: {e}");
                return vec![failed];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                let mut failed = ProcessResult::new(output_dir);
                failed.message = format!("Failed to create output directory: {e}");
                return vec![failed];
            }
        }

        let process = |input: &PathBuf| {
            let output = input
                .file_name()
                .map_or_else(|| output_dir.to_path_buf(), |name| output_dir.join(name));
            self.process_file(input, &output, opts)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries.iter().map(process).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_support;

    fn engine() -> WatermarkEngine {
        WatermarkEngine::with_store(test_support::synthetic_store())
    }

    #[test]
    fn remove_leaves_pixels_outside_rect_untouched() {
        let engine = engine();
        let original = test_support::gradient(400, 300);
        let cleaned = engine
            .remove(&DynamicImage::ImageRgba8(original.clone()))
            .unwrap();
        let rect = placement::watermark_info(400, 300).unwrap().position;

        for (x, y, px) in cleaned.enumerate_pixels() {
            if !rect.contains(x, y) {
                assert_eq!(px, original.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn remove_in_place_reports_placement() {
        let engine = engine();
        let mut img = test_support::gradient(1200, 1100);
        let info = engine.remove_in_place(&mut img).unwrap();
        assert_eq!(info.size, 96);
        assert_eq!(info.position, Rect::new(1040, 940, 1136, 1036));
    }

    #[test]
    fn too_small_image_is_out_of_bounds() {
        let engine = engine();
        let img = DynamicImage::ImageRgba8(test_support::gradient(60, 60));
        assert!(matches!(engine.detect(&img), Err(Error::OutOfBounds { .. })));
        assert!(matches!(engine.remove(&img), Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn zero_sized_image_is_invalid_input() {
        let engine = engine();
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(matches!(engine.detect(&img), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn drifted_asset_surfaces_as_size_mismatch() {
        let store = test_support::synthetic_store().with_asset(48, test_support::capture_png(40));
        let engine = WatermarkEngine::with_store(store);
        let img = DynamicImage::ImageRgba8(test_support::gradient(300, 200));
        assert!(matches!(
            engine.remove(&img),
            Err(Error::SizeMismatch { have: 1600, want: 2304 })
        ));
    }
}
