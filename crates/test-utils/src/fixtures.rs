//! Common test fixtures for hazard indicator tests.

use hazard_common::{CoordinateAxis, DerivedGrid, YearlyGrid};

use crate::generators::{daily_humidity_grid, daily_temperature_grid};

/// GCM used by the synthetic datasets.
pub const TEST_GCM: &str = "NorESM2-MM";

/// Scenario used by the synthetic datasets.
pub const TEST_SCENARIO: &str = "ssp585";

/// 32°C in Kelvin.
pub const THRESHOLD_32C: f64 = 32.0 + 273.15;

/// Calendar lengths of the synthetic years; deliberately irregular.
pub fn test_year_lengths() -> Vec<(i32, usize)> {
    vec![(2028, 366), (2029, 365), (2030, 360), (2031, 365)]
}

/// Daily maximum temperature (`tasmax`) for 2028..=2031 on a 4x3 grid.
pub fn create_test_datasets() -> Vec<YearlyGrid> {
    test_year_lengths()
        .into_iter()
        .map(|(year, days)| daily_temperature_grid("tasmax", year, 4, 3, days))
        .collect()
}

/// Daily mean temperature (`tas`) and humidity (`hurs`) for 2028..=2031 on a 4x3 grid.
pub fn create_work_loss_datasets() -> Vec<YearlyGrid> {
    test_year_lengths()
        .into_iter()
        .flat_map(|(year, days)| {
            [
                daily_temperature_grid("tas", year, 4, 3, days),
                daily_humidity_grid(year, 4, 3, days),
            ]
        })
        .collect()
}

/// A 3x3 grid as might result from averaging over time.
///
/// The longitude axis is deliberately not aligned with the latitude axis:
/// lat = [0, 1, 2], lon = [0, 0.5, 1].
pub fn create_test_dataset_averaged() -> DerivedGrid {
    let lat = CoordinateAxis::new("lat", vec![0.0, 1.0, 2.0]).expect("valid lat axis");
    let lon = CoordinateAxis::new("lon", vec![0.0, 0.5, 1.0]).expect("valid lon axis");
    let temperature = vec![
        293.0, 298.0, 310.0, //
        308.0, 300.0, 315.0, //
        301.0, 309.0, 302.0,
    ];
    DerivedGrid::new(lat, lon, 2030, temperature)
        .expect("consistent grid shape")
        .with_attribute("units", "K")
}

/// Longitude queries for the averaged fixture.
pub const AVERAGED_QUERY_LON: [f64; 2] = [0.0, 1.0];

/// Latitude queries for the averaged fixture.
pub const AVERAGED_QUERY_LAT: [f64; 2] = [1.0, 2.0];

/// Expected floored values for the averaged fixture queries.
pub const AVERAGED_EXPECTED: [f32; 2] = [308.0, 302.0];

/// Create a temporary directory for a test store.
pub fn temp_store_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_averaged_fixture_floors() {
        let grid = create_test_dataset_averaged();
        let values: Vec<f32> = AVERAGED_QUERY_LON
            .iter()
            .zip(AVERAGED_QUERY_LAT.iter())
            .map(|(&lon, &lat)| grid.get_floored(lon, lat).unwrap())
            .collect();
        assert_eq!(values, AVERAGED_EXPECTED);
    }

    #[test]
    fn test_work_loss_datasets_pair_quantities() {
        let grids = create_work_loss_datasets();
        assert_eq!(grids.len(), 8);
        assert!(grids.iter().any(|g| g.quantity() == "hurs" && g.year() == 2030));
    }
}
