//! Zarr V3 grid store on the local filesystem.
//!
//! Each artifact is a 2-D float32 array `[lat, lon]` at `{root}/{path}`,
//! chunked in square tiles and compressed per [`StoreConfig`]. Coordinates
//! and descriptive attributes travel in the array attributes.
//!
//! Writes build the complete array under `{root}/.staging/{id}` and rename it
//! into place, so an interrupted or failed write never leaves a partial
//! artifact at the target path.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use hazard_common::{CoordinateAxis, DerivedGrid};

use super::staging::{StagingGuard, STAGING_DIR};
use crate::cache::{artifact_id, ChunkCache, ChunkKey};
use crate::config::{StoreConfig, ZarrCompression};
use crate::error::{Result, StoreError};
use crate::floor::floor_cells;
use crate::path::path_segments;
use crate::target::{ReadGrid, WriteGrid};
use crate::types::{CacheStats, GridWriteResult, StoredGridMetadata};

const ATTR_CENTRAL_YEAR: &str = "central_year";
const ATTR_LAT: &str = "lat";
const ATTR_LON: &str = "lon";
const ATTR_ATTRIBUTES: &str = "attributes";
const ATTR_VERSION: &str = "version";

/// An opened artifact with its decoded layout.
struct OpenedGrid {
    array: Array<FilesystemStore>,
    lat: CoordinateAxis,
    lon: CoordinateAxis,
    metadata: StoredGridMetadata,
    attributes: BTreeMap<String, String>,
    cache_id: u64,
}

/// Grid store writing one Zarr V3 array per artifact.
pub struct ZarrGridStore {
    root: PathBuf,
    store: Arc<FilesystemStore>,
    config: StoreConfig,
    chunk_cache: Mutex<ChunkCache>,
    swap_lock: Mutex<()>,
}

impl ZarrGridStore {
    /// Open (creating if needed) a store rooted at `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(root, StoreConfig::default())
    }

    /// Open a store with explicit configuration.
    pub fn with_config(root: impl Into<PathBuf>, config: StoreConfig) -> Result<Self> {
        config.validate().map_err(StoreError::Config)?;

        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let store = FilesystemStore::new(&root).map_err(|e| StoreError::Io(e.to_string()))?;
        let chunk_cache = ChunkCache::new(config.chunk_cache_size_bytes(), config.chunk_size);

        info!(
            root = %root.display(),
            chunk_size = config.chunk_size,
            compression = %config.compression,
            "Opened Zarr grid store"
        );

        Ok(Self {
            root,
            store: Arc::new(store),
            config,
            chunk_cache: Mutex::new(chunk_cache),
            swap_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Chunk cache statistics for floored reads.
    pub fn cache_stats(&self) -> CacheStats {
        self.chunk_cache.lock().stats()
    }

    fn artifact_dir(&self, segments: &[&str]) -> PathBuf {
        segments
            .iter()
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }

    /// Write the complete array into a fresh staging directory.
    fn stage(&self, staging_dir: &Path, grid: &DerivedGrid, version: &str) -> Result<()> {
        std::fs::create_dir_all(staging_dir)?;
        let staging_store =
            FilesystemStore::new(staging_dir).map_err(|e| StoreError::Io(e.to_string()))?;

        let (rows, cols) = grid.shape();
        let chunk_rows = self.config.chunk_size.min(rows).max(1);
        let chunk_cols = self.config.chunk_size.min(cols).max(1);

        let mut attrs = serde_json::Map::new();
        attrs.insert(
            ATTR_CENTRAL_YEAR.to_string(),
            serde_json::json!(grid.central_year()),
        );
        attrs.insert(ATTR_LAT.to_string(), serde_json::json!(grid.lat().values()));
        attrs.insert(ATTR_LON.to_string(), serde_json::json!(grid.lon().values()));
        attrs.insert(
            ATTR_ATTRIBUTES.to_string(),
            serde_json::to_value(grid.attributes())?,
        );
        attrs.insert(ATTR_VERSION.to_string(), serde_json::json!(version));
        attrs.insert("dimensions".to_string(), serde_json::json!(["lat", "lon"]));
        attrs.insert(
            "created_at".to_string(),
            serde_json::json!(Utc::now().to_rfc3339()),
        );

        let chunk_grid: zarrs::array::ChunkGrid = vec![chunk_rows as u64, chunk_cols as u64]
            .try_into()
            .map_err(|e| StoreError::Config(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            vec![rows as u64, cols as u64],
            DataType::Float32,
            chunk_grid,
            FillValue::from(f32::NAN),
        );
        let mut builder = binding.attributes(attrs);
        if self.config.compression != ZarrCompression::None {
            builder = builder.bytes_to_bytes_codecs(vec![self.create_compression_codec()?]);
        }

        let array = builder
            .build(Arc::new(staging_store), "/")
            .map_err(StoreError::zarr)?;
        array.store_metadata().map_err(StoreError::zarr)?;

        let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![rows as u64, cols as u64])
            .map_err(StoreError::zarr)?;
        array
            .store_array_subset_elements(&subset, grid.data())
            .map_err(StoreError::zarr)?;

        Ok(())
    }

    /// Create the compression codec based on configuration.
    fn create_compression_codec(
        &self,
    ) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.compression_level)
            .map_err(|_| StoreError::Config("Invalid compression level".to_string()))?;

        let shuffle = if self.config.shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // typesize is required when shuffle is enabled
        let typesize = self.config.shuffle.then_some(4);

        let compressor = match self.config.compression {
            ZarrCompression::None => {
                return Err(StoreError::Config("No compression configured".to_string()))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Arc::new(codec))
    }

    /// Reject a path that would overlap another artifact on disk: one nested
    /// inside an existing array, or one whose directory holds other arrays.
    fn check_disjoint(&self, path: &str, segments: &[&str]) -> Result<()> {
        let mut dir = self.root.clone();
        for (depth, segment) in segments.iter().enumerate() {
            dir.push(segment);
            if depth + 1 < segments.len() && dir.join("zarr.json").is_file() {
                return Err(StoreError::invalid_path(
                    path,
                    format!("nested inside artifact '{}'", segments[..=depth].join("/")),
                ));
            }
        }
        if dir.exists() && !dir.join("zarr.json").is_file() {
            return Err(StoreError::invalid_path(
                path,
                "directory exists and is not an artifact",
            ));
        }
        Ok(())
    }

    /// Swap a staged artifact into place at `segments`, displacing any
    /// previous artifact at the same path.
    fn publish(
        &self,
        staged: &mut StagingGuard,
        path: &str,
        segments: &[&str],
        version: &str,
    ) -> Result<()> {
        let _swap = self.swap_lock.lock();

        self.check_disjoint(path, segments)?;
        let target = self.artifact_dir(segments);
        let target = target.as_path();
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let displaced = if target.exists() {
            let aside = self
                .root
                .join(STAGING_DIR)
                .join(format!("{}.replaced", version));
            std::fs::rename(target, &aside)?;
            Some(StagingGuard::new(aside))
        } else {
            None
        };

        if let Err(e) = std::fs::rename(staged.path(), target) {
            if let Some(mut previous) = displaced {
                match std::fs::rename(previous.path(), target) {
                    Ok(()) => previous.disarm(),
                    Err(restore) => {
                        warn!(target = %target.display(), error = %restore, "Failed to restore previous artifact")
                    }
                }
            }
            return Err(e.into());
        }
        staged.disarm();
        Ok(())
    }

    fn open_grid(&self, path: &str) -> Result<OpenedGrid> {
        let segments = path_segments(path)?;
        if !self.artifact_dir(&segments).join("zarr.json").is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let array = Array::open(self.store.clone(), &format!("/{}", path))
            .map_err(StoreError::zarr)?;

        let shape = array.shape().to_vec();
        if shape.len() != 2 {
            return Err(StoreError::invalid_metadata(
                path,
                format!("expected [lat, lon], found {} dimensions", shape.len()),
            ));
        }
        let (rows, cols) = (shape[0] as usize, shape[1] as usize);

        let origin = vec![0u64; shape.len()];
        let chunk_shape = array
            .chunk_grid()
            .chunk_shape(&origin, array.shape())
            .map_err(|e| StoreError::invalid_metadata(path, e.to_string()))?
            .ok_or_else(|| StoreError::invalid_metadata(path, "missing chunk shape"))?;
        let chunk_shape = (chunk_shape[0].get() as usize, chunk_shape[1].get() as usize);

        let attrs = array.attributes();
        let lat = axis_from_attrs(attrs, ATTR_LAT, path)?;
        let lon = axis_from_attrs(attrs, ATTR_LON, path)?;
        if lat.len() != rows || lon.len() != cols {
            return Err(StoreError::invalid_metadata(
                path,
                format!(
                    "coordinate lengths ({}, {}) do not match array shape ({}, {})",
                    lat.len(),
                    lon.len(),
                    rows,
                    cols
                ),
            ));
        }

        let central_year = attrs
            .get(ATTR_CENTRAL_YEAR)
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| StoreError::invalid_metadata(path, "missing 'central_year' attribute"))?;

        let attributes: BTreeMap<String, String> = match attrs.get(ATTR_ATTRIBUTES) {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                StoreError::invalid_metadata(path, format!("bad 'attributes': {}", e))
            })?,
            None => BTreeMap::new(),
        };

        let version = attrs
            .get(ATTR_VERSION)
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let cache_id = artifact_id(path, version);

        Ok(OpenedGrid {
            array,
            lat,
            lon,
            metadata: StoredGridMetadata {
                shape: (rows, cols),
                chunk_shape,
                central_year,
            },
            attributes,
            cache_id,
        })
    }

    /// Read one chunk, going through the chunk cache.
    fn read_chunk(&self, grid: &OpenedGrid, chunk_row: usize, chunk_col: usize) -> Result<Arc<[f32]>> {
        let key = ChunkKey::new(grid.cache_id, chunk_row, chunk_col);
        if let Some(chunk) = self.chunk_cache.lock().get(&key) {
            return Ok(chunk);
        }

        let (chunk_h, chunk_w) = grid.metadata.chunk_shape;
        let (actual_h, actual_w) = grid.metadata.chunk_extent(chunk_row, chunk_col);
        let subset = ArraySubset::new_with_start_shape(
            vec![(chunk_row * chunk_h) as u64, (chunk_col * chunk_w) as u64],
            vec![actual_h as u64, actual_w as u64],
        )
        .map_err(StoreError::zarr)?;
        let data: Vec<f32> = grid
            .array
            .retrieve_array_subset_elements(&subset)
            .map_err(StoreError::zarr)?;

        let chunk: Arc<[f32]> = data.into();
        self.chunk_cache.lock().insert(key, Arc::clone(&chunk));
        Ok(chunk)
    }
}

fn axis_from_attrs(
    attrs: &serde_json::Map<String, serde_json::Value>,
    name: &str,
    path: &str,
) -> Result<CoordinateAxis> {
    let values: Vec<f64> = attrs
        .get(name)
        .cloned()
        .ok_or_else(|| StoreError::invalid_metadata(path, format!("missing '{}' attribute", name)))
        .and_then(|v| {
            serde_json::from_value(v)
                .map_err(|e| StoreError::invalid_metadata(path, format!("bad '{}': {}", name, e)))
        })?;
    Ok(CoordinateAxis::new(name, values)?)
}

impl WriteGrid for ZarrGridStore {
    #[instrument(skip(self, grid), fields(root = %self.root.display()))]
    fn write(&self, path: &str, grid: &DerivedGrid) -> Result<GridWriteResult> {
        let segments = path_segments(path)?;

        let version = uuid::Uuid::new_v4().simple().to_string();
        let mut staged = StagingGuard::new(self.root.join(STAGING_DIR).join(&version));

        self.stage(staged.path(), grid, &version)?;
        self.publish(&mut staged, path, &segments, &version)?;

        let bytes_written = std::mem::size_of_val(grid.data()) as u64;
        debug!(path = %path, shape = ?grid.shape(), bytes_written, "Wrote grid");

        Ok(GridWriteResult {
            path: path.to_string(),
            shape: grid.shape(),
            bytes_written,
        })
    }
}

impl ReadGrid for ZarrGridStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn read(&self, path: &str) -> Result<DerivedGrid> {
        let opened = self.open_grid(path)?;
        let (rows, cols) = opened.metadata.shape;
        let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![rows as u64, cols as u64])
            .map_err(StoreError::zarr)?;
        let data: Vec<f32> = opened
            .array
            .retrieve_array_subset_elements(&subset)
            .map_err(StoreError::zarr)?;

        Ok(
            DerivedGrid::new(opened.lat, opened.lon, opened.metadata.central_year, data)?
                .with_attributes(opened.attributes),
        )
    }

    #[instrument(skip(self, x, y), fields(root = %self.root.display(), queries = x.len()))]
    fn read_floored(&self, path: &str, x: &[f64], y: &[f64]) -> Result<Vec<f32>> {
        let opened = self.open_grid(path)?;
        let cells = floor_cells(&opened.lat, &opened.lon, x, y)?;

        // Group queries by chunk so each chunk is decoded at most once.
        let mut by_chunk: HashMap<(usize, usize), Vec<(usize, usize, usize)>> = HashMap::new();
        for (index, (row, col)) in cells.into_iter().enumerate() {
            by_chunk
                .entry(opened.metadata.chunk_of(row, col))
                .or_default()
                .push((index, row, col));
        }

        let (chunk_h, chunk_w) = opened.metadata.chunk_shape;
        let mut values = vec![f32::NAN; x.len()];
        for ((chunk_row, chunk_col), queries) in &by_chunk {
            let data = self.read_chunk(&opened, *chunk_row, *chunk_col)?;
            let (_, actual_w) = opened.metadata.chunk_extent(*chunk_row, *chunk_col);
            for &(index, row, col) in queries {
                let local_row = row - chunk_row * chunk_h;
                let local_col = col - chunk_col * chunk_w;
                values[index] = data[local_row * actual_w + local_col];
            }
        }

        debug!(path = %path, chunks = by_chunk.len(), "Sampled grid");
        Ok(values)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let segments = path_segments(path)?;
        Ok(self.artifact_dir(&segments).join("zarr.json").is_file())
    }
}
