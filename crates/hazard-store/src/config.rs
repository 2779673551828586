//! Chunking, compression and cache settings for the grid store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for [`ZarrGridStore`](crate::ZarrGridStore). Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Edge length of the square chunks grids are split into.
    pub chunk_size: usize,

    pub compression: ZarrCompression,

    /// Blosc level, 1-9.
    pub compression_level: u8,

    /// Byte shuffle before compressing.
    pub shuffle: bool,

    /// Budget for decoded chunks kept by floored reads, in megabytes.
    pub chunk_cache_size_mb: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            compression: ZarrCompression::BloscZstd,
            compression_level: 1,
            shuffle: true,
            chunk_cache_size_mb: 256,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `HAZARD_CHUNK_SIZE`, `HAZARD_COMPRESSION`,
    /// `HAZARD_COMPRESSION_LEVEL`, `HAZARD_SHUFFLE` and `HAZARD_CHUNK_CACHE_MB`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Override fields from `HAZARD_*` variables resolved by `lookup`.
    ///
    /// Unparsable values are logged and leave the field unchanged.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = parsed(&lookup, "HAZARD_CHUNK_SIZE") {
            self.chunk_size = size;
        }
        if let Some(compression) = parsed(&lookup, "HAZARD_COMPRESSION") {
            self.compression = compression;
        }
        if let Some(level) = parsed(&lookup, "HAZARD_COMPRESSION_LEVEL") {
            self.compression_level = level;
        }
        if let Some(shuffle) = lookup("HAZARD_SHUFFLE") {
            self.shuffle = matches!(shuffle.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(mb) = parsed(&lookup, "HAZARD_CHUNK_CACHE_MB") {
            self.chunk_cache_size_mb = mb;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }
        if !(1..=9).contains(&self.compression_level) {
            return Err(format!(
                "compression_level must be 1-9, got {}",
                self.compression_level
            ));
        }
        if self.chunk_cache_size_mb == 0 {
            return Err("chunk_cache_size_mb must be > 0".to_string());
        }
        Ok(())
    }

    pub fn chunk_cache_size_bytes(&self) -> usize {
        self.chunk_cache_size_mb.saturating_mul(1024 * 1024)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring invalid store setting");
            None
        }
    }
}

/// Codec applied to every chunk of a stored grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZarrCompression {
    None,
    BloscLz4,
    #[default]
    BloscZstd,
}

impl ZarrCompression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl FromStr for ZarrCompression {
    type Err = String;

    /// Case-insensitive; `lz4` and `zstd` are accepted as short forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lz4" | "blosc_lz4" => Ok(Self::BloscLz4),
            "zstd" | "blosc_zstd" => Ok(Self::BloscZstd),
            other => Err(format!("unknown compression '{}'", other)),
        }
    }
}

impl fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
