//! Error types for the gwatermark crate.

use std::sync::Arc;

use crate::placement::Rect;

/// Errors that can occur during watermark detection and removal.
///
/// The type is `Clone` so that alpha mask load failures can be memoized and
/// handed to every caller; foreign errors are shared behind an [`Arc`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The input was empty, had zero dimensions, or was otherwise unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The watermark rectangle does not fit inside the image.
    #[error("watermark rectangle {rect} out of bounds for {width}x{height} image")]
    OutOfBounds {
        /// The rectangle that was rejected.
        rect: Rect,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// An alpha mask was requested for a logo size without a preset.
    #[error("unsupported watermark size {0}")]
    UnsupportedSize(u32),

    /// The reference capture for a logo size could not be read or decoded.
    #[error("failed to load alpha mask for size {size}: {reason}")]
    AssetLoad {
        /// Logo size whose asset failed.
        size: u32,
        /// Underlying cause.
        reason: String,
    },

    /// The alpha mask does not cover the watermark rectangle exactly.
    #[error("alpha map size mismatch: have {have}, want {want}")]
    SizeMismatch {
        /// Number of mask entries available.
        have: usize,
        /// Number of pixels in the rectangle.
        want: usize,
    },

    /// A detection region contained no pixels to sample.
    #[error("insufficient pixels to evaluate watermark: {0}")]
    InsufficientPixels(&'static str),

    /// The alpha mask has no opacity at all.
    #[error("alpha map missing opaque pixels for scoring")]
    NoOpaqueSignal,

    /// Image bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(#[source] Arc<image::ImageError>),

    /// An image could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(#[source] Arc<image::ImageError>),

    /// Base64 text could not be decoded.
    #[error("decode base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// The output format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub(crate) fn decode(err: image::ImageError) -> Self {
        Self::Decode(Arc::new(err))
    }

    pub(crate) fn encode(err: image::ImageError) -> Self {
        Self::Encode(Arc::new(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
