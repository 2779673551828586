//! Annual reduction and window averaging shared by all indicators.

use hazard_common::{CoordinateAxis, DerivedGrid, YearlyGrid};

use super::IndicatorTransform;
use crate::error::{ModelError, Result};

/// Collapse of daily values over one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnualReduction {
    /// Sum of daily values rescaled to a `basis_days` year:
    /// `sum * basis_days / time_len`. NaN days contribute nothing.
    ScaledSum { basis_days: f64 },
    /// Mean over the days with a finite value; NaN when there are none.
    Mean,
}

impl AnnualReduction {
    /// Scaled sum on a 365-day basis.
    pub const fn annual_total() -> Self {
        Self::ScaledSum { basis_days: 365.0 }
    }
}

/// Compute one annual value per cell for a single year.
///
/// `inputs` holds one grid per quantity of `transform`, in order. All of them
/// must share coordinates and calendar length.
pub fn annualize<T: IndicatorTransform + ?Sized>(
    transform: &T,
    year: i32,
    inputs: &[&YearlyGrid],
) -> Result<Vec<f64>> {
    let first = inputs
        .first()
        .ok_or_else(|| ModelError::inconsistent(year, "no input quantities"))?;
    let time_len = first.time_len();
    if time_len == 0 {
        return Err(ModelError::inconsistent(
            year,
            format!("'{}' has an empty time axis", first.quantity()),
        ));
    }
    for grid in &inputs[1..] {
        if !grid.same_layout(first) || grid.time_len() != time_len {
            return Err(ModelError::inconsistent(
                year,
                format!(
                    "'{}' {:?} does not match '{}' {:?}",
                    grid.quantity(),
                    grid.shape(),
                    first.quantity(),
                    first.shape()
                ),
            ));
        }
    }

    let cells = first.cells();
    let mut sums = vec![0.0f64; cells];
    let mut counts = vec![0usize; cells];
    let mut day_inputs = vec![0.0f64; inputs.len()];

    for t in 0..time_len {
        let days: Vec<&[f32]> = inputs.iter().map(|grid| grid.day(t)).collect();
        for cell in 0..cells {
            for (slot, day) in day_inputs.iter_mut().zip(&days) {
                *slot = f64::from(day[cell]);
            }
            let value = transform.daily_value(&day_inputs);
            if !value.is_nan() {
                sums[cell] += value;
                counts[cell] += 1;
            }
        }
    }

    let annual = match transform.reduction() {
        AnnualReduction::ScaledSum { basis_days } => {
            let scale = basis_days / time_len as f64;
            sums.into_iter().map(|sum| sum * scale).collect()
        }
        AnnualReduction::Mean => sums
            .into_iter()
            .zip(counts)
            .map(|(sum, n)| if n == 0 { f64::NAN } else { sum / n as f64 })
            .collect(),
    };
    Ok(annual)
}

/// Running elementwise sum of annual grids over a window.
///
/// The first year fixes the coordinates; every later year must match them.
#[derive(Debug, Default)]
pub struct WindowAccumulator {
    axes: Option<(CoordinateAxis, CoordinateAxis)>,
    sums: Vec<f64>,
    years: usize,
}

impl WindowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one year's annual values, laid out on `lat` × `lon`.
    pub fn add_year(
        &mut self,
        year: i32,
        lat: &CoordinateAxis,
        lon: &CoordinateAxis,
        annual: &[f64],
    ) -> Result<()> {
        if annual.len() != lat.len() * lon.len() {
            return Err(ModelError::inconsistent(
                year,
                format!(
                    "{} annual values for a {}x{} grid",
                    annual.len(),
                    lat.len(),
                    lon.len()
                ),
            ));
        }

        match &self.axes {
            None => {
                self.axes = Some((lat.clone(), lon.clone()));
                self.sums = annual.to_vec();
            }
            Some((ref_lat, ref_lon)) => {
                if ref_lat.values() != lat.values() || ref_lon.values() != lon.values() {
                    return Err(ModelError::inconsistent(
                        year,
                        format!(
                            "coordinates ({}x{}) differ from the first year of the window ({}x{})",
                            lat.len(),
                            lon.len(),
                            ref_lat.len(),
                            ref_lon.len()
                        ),
                    ));
                }
                for (sum, value) in self.sums.iter_mut().zip(annual) {
                    *sum += value;
                }
            }
        }
        self.years += 1;
        Ok(())
    }

    /// Number of years added so far.
    pub fn years(&self) -> usize {
        self.years
    }

    /// Average the accumulated years into the grid for `central_year`.
    pub fn finish(self, central_year: i32) -> Result<DerivedGrid> {
        let (lat, lon) = self
            .axes
            .ok_or_else(|| ModelError::inconsistent(central_year, "window contains no years"))?;
        let n = self.years as f64;
        let data = self.sums.into_iter().map(|sum| (sum / n) as f32).collect();
        Ok(DerivedGrid::new(lat, lon, central_year, data)?)
    }
}
