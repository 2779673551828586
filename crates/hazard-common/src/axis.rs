//! Coordinate axes and floored coordinate lookup.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Ordering of the values along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisDirection {
    Ascending,
    Descending,
}

/// A named, strictly monotonic 1-D coordinate axis (e.g. `lat`, `lon`).
///
/// Latitude axes are frequently stored north-to-south, so both directions
/// are accepted. A single-valued axis is treated as ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAxis", into = "RawAxis")]
pub struct CoordinateAxis {
    name: String,
    values: Vec<f64>,
    direction: AxisDirection,
}

#[derive(Serialize, Deserialize)]
struct RawAxis {
    name: String,
    values: Vec<f64>,
}

impl TryFrom<RawAxis> for CoordinateAxis {
    type Error = GridError;

    fn try_from(raw: RawAxis) -> GridResult<Self> {
        CoordinateAxis::new(raw.name, raw.values)
    }
}

impl From<CoordinateAxis> for RawAxis {
    fn from(axis: CoordinateAxis) -> Self {
        RawAxis {
            name: axis.name,
            values: axis.values,
        }
    }
}

impl CoordinateAxis {
    /// Create an axis, validating that it is non-empty, finite and strictly monotonic.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> GridResult<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(GridError::EmptyAxis(name));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(GridError::NonFiniteAxis { name, index });
        }

        let direction = if values.len() > 1 && values[1] < values[0] {
            AxisDirection::Descending
        } else {
            AxisDirection::Ascending
        };

        for (i, pair) in values.windows(2).enumerate() {
            let ordered = match direction {
                AxisDirection::Ascending => pair[0] < pair[1],
                AxisDirection::Descending => pair[0] > pair[1],
            };
            if !ordered {
                return Err(GridError::NonMonotonicAxis { name, index: i + 1 });
            }
        }

        Ok(Self {
            name,
            values,
            direction,
        })
    }

    /// Evenly spaced axis: `start, start + step, ...` with `len` values.
    pub fn regular(name: impl Into<String>, start: f64, step: f64, len: usize) -> GridResult<Self> {
        let values = (0..len).map(|i| start + i as f64 * step).collect();
        Self::new(name, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn direction(&self) -> AxisDirection {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: empty axes cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest coordinate value on the axis.
    pub fn min(&self) -> f64 {
        match self.direction {
            AxisDirection::Ascending => self.values[0],
            AxisDirection::Descending => self.values[self.values.len() - 1],
        }
    }

    /// Largest coordinate value on the axis.
    pub fn max(&self) -> f64 {
        match self.direction {
            AxisDirection::Ascending => self.values[self.values.len() - 1],
            AxisDirection::Descending => self.values[0],
        }
    }

    /// Index of the greatest axis value that is `<= query`.
    ///
    /// Returns `None` when the query is below every axis value or is NaN.
    /// Queries above the maximum floor to the maximum.
    pub fn floor_index(&self, query: f64) -> Option<usize> {
        if query.is_nan() {
            return None;
        }
        match self.direction {
            AxisDirection::Ascending => {
                let above = self.values.partition_point(|&v| v <= query);
                above.checked_sub(1)
            }
            AxisDirection::Descending => {
                let idx = self.values.partition_point(|&v| v > query);
                (idx < self.values.len()).then_some(idx)
            }
        }
    }
}
