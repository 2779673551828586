//! Yearly datasets stored as Zarr V3 arrays on the local filesystem.
//!
//! Layout: one 3-D array of shape `[time, lat, lon]` per year at
//! `{root}/{gcm}/{scenario}/{quantity}/{year}`. Coordinate values are kept in
//! the array attributes (`lat`, `lon`), so a year can be opened without any
//! side lookup table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use hazard_common::{validate_identifier, CoordinateAxis, YearlyGrid};

use crate::error::{Result, SourceError};
use crate::guard::{DatasetGuard, HandleTracker};
use crate::source::{ChunkHint, OpenDataset};

/// Zarr path of the array holding one year of one quantity.
pub fn year_array_path(gcm: &str, scenario: &str, quantity: &str, year: i32) -> String {
    format!("/{}/{}/{}/{}", gcm, scenario, quantity, year)
}

fn validate_key(gcm: &str, scenario: &str, quantity: &str) -> Result<()> {
    validate_identifier(gcm)?;
    validate_identifier(scenario)?;
    validate_identifier(quantity)?;
    Ok(())
}

fn open_store(root: &Path) -> Result<Arc<FilesystemStore>> {
    std::fs::create_dir_all(root)?;
    let store = FilesystemStore::new(root).map_err(|e| SourceError::Storage(e.to_string()))?;
    Ok(Arc::new(store))
}

/// Dataset source reading yearly Zarr arrays from a directory tree.
pub struct ZarrYearSource {
    root: PathBuf,
    store: Arc<FilesystemStore>,
    tracker: HandleTracker,
}

impl ZarrYearSource {
    /// Open a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let store = open_store(&root)?;
        Ok(Self {
            root,
            store,
            tracker: HandleTracker::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of grids currently handed out and not yet released.
    pub fn open_handles(&self) -> usize {
        self.tracker.open_handles()
    }

    fn exists(&self, gcm: &str, scenario: &str, quantity: &str, year: i32) -> bool {
        self.root
            .join(gcm)
            .join(scenario)
            .join(quantity)
            .join(year.to_string())
            .join("zarr.json")
            .is_file()
    }

    fn read_year(
        &self,
        path: &str,
        quantity: &str,
        year: i32,
        chunks: Option<ChunkHint>,
    ) -> Result<YearlyGrid> {
        let array = Array::open(self.store.clone(), path).map_err(|e| SourceError::read(path, e))?;

        let shape = array.shape().to_vec();
        if shape.len() != 3 {
            return Err(SourceError::invalid_metadata(
                path,
                format!("expected [time, lat, lon], found {} dimensions", shape.len()),
            ));
        }
        let (time_len, ny, nx) = (shape[0] as usize, shape[1] as usize, shape[2] as usize);

        let attrs = array.attributes();
        let lat = axis_from_attrs(attrs, "lat", path)?;
        let lon = axis_from_attrs(attrs, "lon", path)?;
        if lat.len() != ny || lon.len() != nx {
            return Err(SourceError::invalid_metadata(
                path,
                format!(
                    "coordinate lengths ({}, {}) do not match array shape ({}, {})",
                    lat.len(),
                    lon.len(),
                    ny,
                    nx
                ),
            ));
        }

        let step = chunks
            .and_then(|c| c.time)
            .filter(|&t| t > 0)
            .unwrap_or(time_len.max(1));

        let mut data: Vec<f32> = Vec::with_capacity(time_len * ny * nx);
        let mut start = 0;
        while start < time_len {
            let count = step.min(time_len - start);
            let subset = ArraySubset::new_with_start_shape(
                vec![start as u64, 0, 0],
                vec![count as u64, ny as u64, nx as u64],
            )
            .map_err(|e| SourceError::read(path, e))?;
            let slab: Vec<f32> = array
                .retrieve_array_subset_elements(&subset)
                .map_err(|e| SourceError::read(path, e))?;
            data.extend_from_slice(&slab);
            start += count;
        }

        debug!(path = %path, time_len, ny, nx, "Read yearly dataset");
        Ok(YearlyGrid::new(quantity, year, lat, lon, time_len, data)?)
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
        .ok_or_else(|| SourceError::invalid_metadata(path, format!("missing '{}' attribute", name)))
        .and_then(|v| {
            serde_json::from_value(v)
                .map_err(|e| SourceError::invalid_metadata(path, format!("bad '{}': {}", name, e)))
        })?;
    Ok(CoordinateAxis::new(name, values)?)
}

impl OpenDataset for ZarrYearSource {
    fn gcms(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Failed to list gcms");
                return Vec::new();
            }
        };

        let mut gcms: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        gcms.sort();
        gcms
    }

    #[instrument(skip(self, chunks), fields(root = %self.root.display()))]
    fn open_dataset_year(
        &self,
        gcm: &str,
        scenario: &str,
        quantity: &str,
        year: i32,
        chunks: Option<ChunkHint>,
    ) -> Result<DatasetGuard<'_>> {
        validate_key(gcm, scenario, quantity)?;
        if !self.exists(gcm, scenario, quantity, year) {
            return Err(SourceError::not_found(gcm, scenario, quantity, year));
        }

        let path = year_array_path(gcm, scenario, quantity, year);
        let grid = self.read_year(&path, quantity, year, chunks)?;
        Ok(self.tracker.track(grid))
    }
}

/// Writes yearly grids in the layout [`ZarrYearSource`] reads.
pub struct ZarrYearWriter {
    root: PathBuf,
    store: Arc<FilesystemStore>,
    time_chunk: usize,
}

impl ZarrYearWriter {
    /// Default number of daily steps per chunk.
    pub const DEFAULT_TIME_CHUNK: usize = 73;

    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let store = open_store(&root)?;
        Ok(Self {
            root,
            store,
            time_chunk: Self::DEFAULT_TIME_CHUNK,
        })
    }

    /// Override the number of daily steps stored per chunk.
    pub fn with_time_chunk(mut self, time_chunk: usize) -> Self {
        self.time_chunk = time_chunk.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write one yearly grid, replacing any existing array at its path.
    #[instrument(skip(self, grid), fields(quantity = %grid.quantity(), year = grid.year()))]
    pub fn write(&self, gcm: &str, scenario: &str, grid: &YearlyGrid) -> Result<()> {
        validate_key(gcm, scenario, grid.quantity())?;
        let path = year_array_path(gcm, scenario, grid.quantity(), grid.year());
        let [time_len, ny, nx] = grid.shape();

        // Stale chunks from a previous layout must not survive the rewrite.
        let dir = self
            .root
            .join(gcm)
            .join(scenario)
            .join(grid.quantity())
            .join(grid.year().to_string());
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }

        let mut attrs = serde_json::Map::new();
        attrs.insert("quantity".to_string(), serde_json::json!(grid.quantity()));
        attrs.insert("year".to_string(), serde_json::json!(grid.year()));
        attrs.insert("lat".to_string(), serde_json::json!(grid.lat().values()));
        attrs.insert("lon".to_string(), serde_json::json!(grid.lon().values()));
        attrs.insert(
            "dimensions".to_string(),
            serde_json::json!(["time", "lat", "lon"]),
        );

        let chunk_grid: zarrs::array::ChunkGrid = vec![
            self.time_chunk.min(time_len).max(1) as u64,
            ny as u64,
            nx as u64,
        ]
        .try_into()
        .map_err(|e| SourceError::Storage(format!("{:?}", e)))?;

        let array = ArrayBuilder::new(
            vec![time_len as u64, ny as u64, nx as u64],
            DataType::Float32,
            chunk_grid,
            FillValue::from(f32::NAN),
        )
        .attributes(attrs)
        .build(self.store.clone(), &path)
        .map_err(|e| SourceError::Storage(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| SourceError::Storage(e.to_string()))?;

        if time_len > 0 {
            let subset = ArraySubset::new_with_start_shape(
                vec![0, 0, 0],
                vec![time_len as u64, ny as u64, nx as u64],
            )
            .map_err(|e| SourceError::Storage(e.to_string()))?;
            array
                .store_array_subset_elements(&subset, grid.data())
                .map_err(|e| SourceError::Storage(e.to_string()))?;
        }

        debug!(path = %path, "Wrote yearly dataset");
        Ok(())
    }
}
