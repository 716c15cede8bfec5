//! Alpha masks derived from the reference captures, and their cache.

use std::fmt;
use std::sync::{Arc, OnceLock};

use image::DynamicImage;

use crate::assets::{asset_file_name, AssetStore};
use crate::error::{Error, Result};

/// Logo sizes with a placement preset. A 64px capture exists upstream but
/// has no preset and is never loaded.
pub const SUPPORTED_SIZES: [u32; 2] = [48, 96];

/// Per-pixel logo opacity in `[0, 1]`, row-major.
///
/// Clones share the same storage.
#[derive(Clone, PartialEq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    values: Arc<[f32]>,
}

impl AlphaMask {
    /// Wrap precomputed opacities. `values` is not checked against the
    /// dimensions; consumers reject mismatches with [`Error::SizeMismatch`].
    pub fn from_values(width: u32, height: u32, values: impl Into<Arc<[f32]>>) -> Self {
        Self {
            width,
            height,
            values: values.into(),
        }
    }

    /// Width of the source capture.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the source capture.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of opacity entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mask holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row-major opacities.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Whether both masks share the same storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl fmt::Debug for AlphaMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.values.len())
            .finish()
    }
}

/// Calculate an alpha map from a decoded reference capture.
///
/// The capture shows the logo rendered on a black background, so the
/// opacity at each pixel is `max(R, G, B)` over the channel's full scale.
/// 16-bit captures keep their precision.
#[must_use]
pub fn calculate_alpha_map(capture: &DynamicImage) -> AlphaMask {
    let values: Vec<f32> = match capture {
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => capture
            .to_rgb16()
            .pixels()
            .map(|p| f32::from(p[0].max(p[1]).max(p[2])) / 65535.0)
            .collect(),
        _ => capture
            .to_rgb8()
            .pixels()
            .map(|p| f32::from(p[0].max(p[1]).max(p[2])) / 255.0)
            .collect(),
    };

    AlphaMask::from_values(capture.width(), capture.height(), values)
}

/// Decode capture bytes into an alpha mask.
///
/// # Errors
///
/// Returns [`Error::AssetLoad`] if the bytes are not a decodable image.
pub fn decode_alpha_asset(size: u32, bytes: &[u8]) -> Result<AlphaMask> {
    let capture = image::load_from_memory(bytes).map_err(|e| Error::AssetLoad {
        size,
        reason: format!("decode {}: {e}", asset_file_name(size)),
    })?;
    Ok(calculate_alpha_map(&capture))
}

/// Lazily loads and memoizes one alpha mask per supported logo size.
///
/// Each size is loaded at most once per cache. Concurrent first callers wait
/// for that single load; afterwards reads are lock-free. Failures are
/// memoized too and returned unchanged on every later call.
pub struct AlphaMaskCache {
    store: Arc<dyn AssetStore>,
    slots: [OnceLock<Result<AlphaMask>>; SUPPORTED_SIZES.len()],
}

impl AlphaMaskCache {
    /// An empty cache backed by `store`.
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            slots: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    /// The alpha mask for `size`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSize`] for sizes outside
    /// [`SUPPORTED_SIZES`], or the memoized [`Error::AssetLoad`] when the
    /// capture could not be read or decoded.
    pub fn get(&self, size: u32) -> Result<AlphaMask> {
        let slot = SUPPORTED_SIZES
            .iter()
            .position(|&s| s == size)
            .map(|i| &self.slots[i])
            .ok_or(Error::UnsupportedSize(size))?;

        slot.get_or_init(|| self.load(size)).clone()
    }

    fn load(&self, size: u32) -> Result<AlphaMask> {
        let loaded = self
            .store
            .read_asset(size)
            .map_err(|e| Error::AssetLoad {
                size,
                reason: format!("read {}: {e}", asset_file_name(size)),
            })
            .and_then(|bytes| decode_alpha_asset(size, &bytes));

        match &loaded {
            Ok(mask) => tracing::debug!(
                size,
                width = mask.width(),
                height = mask.height(),
                "loaded alpha mask"
            ),
            Err(e) => tracing::warn!(size, error = %e, "alpha mask unavailable"),
        }
        loaded
    }
}

impl fmt::Debug for AlphaMaskCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded: Vec<u32> = SUPPORTED_SIZES
            .iter()
            .zip(&self.slots)
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(&size, _)| size)
            .collect();
        f.debug_struct("AlphaMaskCache")
            .field("loaded", &loaded)
            .finish_non_exhaustive()
    }
}
