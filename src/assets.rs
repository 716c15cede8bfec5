//! Storage for the reference watermark captures.
//!
//! Each capture is a PNG screenshot of the logo rendered on a black
//! background, named `bg_{size}.png`. Only sizes 48 and 96 are ever
//! requested; a `bg_64.png` capture may ship alongside them but is unused.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default asset directory.
pub const ASSETS_ENV: &str = "GWATERMARK_ASSETS";

/// Source of reference capture bytes, keyed by logo size.
pub trait AssetStore: Send + Sync {
    /// Read the raw (still encoded) capture for `size`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, typically [`io::ErrorKind::NotFound`], when the
    /// capture is unavailable.
    fn read_asset(&self, size: u32) -> io::Result<Vec<u8>>;
}

/// File name of the capture for a logo size.
#[must_use]
pub fn asset_file_name(size: u32) -> String {
    format!("bg_{size}.png")
}

/// Reads captures from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    /// Use captures stored in `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$GWATERMARK_ASSETS` when set, otherwise the crate's `assets/` directory.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var_os(ASSETS_ENV) {
            Some(dir) if !dir.is_empty() => Self::new(dir),
            _ => Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")),
        }
    }

    /// Directory the captures are read from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for DirAssetStore {
    fn read_asset(&self, size: u32) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(asset_file_name(size)))
    }
}

/// Holds captures in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    assets: HashMap<u32, Vec<u8>>,
}

impl MemoryAssetStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the capture for `size`.
    #[must_use]
    pub fn with_asset(mut self, size: u32, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(size, bytes);
        self
    }

    /// Add or replace the capture for `size`.
    pub fn insert(&mut self, size: u32, bytes: impl Into<Vec<u8>>) {
        self.assets.insert(size, bytes.into());
    }
}

impl AssetStore for MemoryAssetStore {
    fn read_asset(&self, size: u32) -> io::Result<Vec<u8>> {
        self.assets.get(&size).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", asset_file_name(size)),
            )
        })
    }
}
