//! Gridded climate data: daily yearly cubes and derived 2-D indicator grids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::axis::CoordinateAxis;
use crate::error::{GridError, GridResult};

/// One year of daily values of a single quantity for one (gcm, scenario).
///
/// Data is stored time-major, then row-major: index `t * (ny * nx) + row * nx + col`,
/// where rows follow `lat` and columns follow `lon`.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyGrid {
    quantity: String,
    year: i32,
    lat: CoordinateAxis,
    lon: CoordinateAxis,
    time_len: usize,
    data: Vec<f32>,
}

impl YearlyGrid {
    /// Create a yearly grid, checking the data length against the axes.
    pub fn new(
        quantity: impl Into<String>,
        year: i32,
        lat: CoordinateAxis,
        lon: CoordinateAxis,
        time_len: usize,
        data: Vec<f32>,
    ) -> GridResult<Self> {
        let shape = [time_len, lat.len(), lon.len()];
        if data.len() != shape.iter().product::<usize>() {
            return Err(GridError::shape_mismatch(&shape, data.len()));
        }
        Ok(Self {
            quantity: quantity.into(),
            year,
            lat,
            lon,
            time_len,
            data,
        })
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn lat(&self) -> &CoordinateAxis {
        &self.lat
    }

    pub fn lon(&self) -> &CoordinateAxis {
        &self.lon
    }

    /// Number of daily samples in this year (365, 366, 360, ...).
    pub fn time_len(&self) -> usize {
        self.time_len
    }

    /// Number of cells in one daily slice.
    pub fn cells(&self) -> usize {
        self.lat.len() * self.lon.len()
    }

    /// Shape as `[time, lat, lon]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.time_len, self.lat.len(), self.lon.len()]
    }

    /// The daily slice for time step `t`, row-major `[lat][lon]`.
    pub fn day(&self, t: usize) -> &[f32] {
        let cells = self.cells();
        &self.data[t * cells..(t + 1) * cells]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// True when both grids share shape and identical coordinate values.
    pub fn same_layout(&self, other: &YearlyGrid) -> bool {
        self.lat.values() == other.lat.values() && self.lon.values() == other.lon.values()
    }
}

/// A 2-D aggregated indicator grid for one central year.
///
/// Data is row-major `[lat][lon]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedGrid {
    lat: CoordinateAxis,
    lon: CoordinateAxis,
    central_year: i32,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    data: Vec<f32>,
}

impl DerivedGrid {
    /// Create a derived grid, checking the data length against the axes.
    pub fn new(
        lat: CoordinateAxis,
        lon: CoordinateAxis,
        central_year: i32,
        data: Vec<f32>,
    ) -> GridResult<Self> {
        let shape = [lat.len(), lon.len()];
        if data.len() != shape.iter().product::<usize>() {
            return Err(GridError::shape_mismatch(&shape, data.len()));
        }
        Ok(Self {
            lat,
            lon,
            central_year,
            attributes: BTreeMap::new(),
            data,
        })
    }

    /// Attach a descriptive attribute (units, indicator id, ...).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn lat(&self) -> &CoordinateAxis {
        &self.lat
    }

    pub fn lon(&self) -> &CoordinateAxis {
        &self.lon
    }

    pub fn central_year(&self) -> i32 {
        self.central_year
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Grid dimensions as `(rows, cols)` = `(lat.len(), lon.len())`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Value at a (row, col) index.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        let (rows, cols) = self.shape();
        if row >= rows || col >= cols {
            return None;
        }
        self.data.get(row * cols + col).copied()
    }

    /// Value at the floored (lon, lat) coordinate, `None` below either axis minimum.
    pub fn get_floored(&self, lon: f64, lat: f64) -> Option<f32> {
        let row = self.lat.floor_index(lat)?;
        let col = self.lon.floor_index(lon)?;
        self.get(row, col)
    }
}
