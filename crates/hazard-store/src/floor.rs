//! Coordinate flooring for point sampling.

use hazard_common::CoordinateAxis;

use crate::error::{Result, StoreError};

/// Resolve paired `(x, y)` queries to `(row, col)` cells.
///
/// `x` is matched against `lon` and `y` against `lat`; query `i` pairs `x[i]`
/// with `y[i]`. Each coordinate snaps to the largest axis value not exceeding
/// it, so values past the axis maximum land on the last cell. A query below
/// the axis minimum (or NaN) has no floor and fails the whole request.
pub fn floor_cells(
    lat: &CoordinateAxis,
    lon: &CoordinateAxis,
    x: &[f64],
    y: &[f64],
) -> Result<Vec<(usize, usize)>> {
    if x.len() != y.len() {
        return Err(StoreError::QueryLengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }

    x.iter()
        .zip(y)
        .enumerate()
        .map(|(index, (&qx, &qy))| {
            let col = floor_on(lon, index, qx)?;
            let row = floor_on(lat, index, qy)?;
            Ok((row, col))
        })
        .collect()
}

fn floor_on(axis: &CoordinateAxis, index: usize, value: f64) -> Result<usize> {
    axis.floor_index(value)
        .ok_or_else(|| StoreError::FloorOutOfRange {
            index,
            axis: axis.name().to_string(),
            value,
            min: axis.min(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> (CoordinateAxis, CoordinateAxis) {
        (
            CoordinateAxis::new("lat", vec![0.0, 1.0, 2.0]).unwrap(),
            CoordinateAxis::new("lon", vec![0.0, 0.5, 1.0]).unwrap(),
        )
    }

    #[test]
    fn test_exact_and_between() {
        let (lat, lon) = axes();
        let cells = floor_cells(&lat, &lon, &[0.0, 0.74, 1.0], &[1.0, 1.99, 2.0]).unwrap();
        assert_eq!(cells, vec![(1, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_above_max_floors_to_last() {
        let (lat, lon) = axes();
        let cells = floor_cells(&lat, &lon, &[50.0], &[50.0]).unwrap();
        assert_eq!(cells, vec![(2, 2)]);
    }

    #[test]
    fn test_below_min_fails() {
        let (lat, lon) = axes();
        let err = floor_cells(&lat, &lon, &[0.5, 0.5], &[1.0, -0.1]).unwrap_err();
        match err {
            StoreError::FloorOutOfRange { index, axis, .. } => {
                assert_eq!(index, 1);
                assert_eq!(axis, "lat");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nan_fails() {
        let (lat, lon) = axes();
        assert!(floor_cells(&lat, &lon, &[f64::NAN], &[1.0]).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let (lat, lon) = axes();
        let err = floor_cells(&lat, &lon, &[0.0, 1.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::QueryLengthMismatch { x_len: 2, y_len: 1 }
        ));
    }

    #[test]
    fn test_empty_query() {
        let (lat, lon) = axes();
        assert!(floor_cells(&lat, &lon, &[], &[]).unwrap().is_empty());
    }
}
