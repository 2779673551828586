//! Generators for synthetic daily climate grids.
//!
//! Values are deterministic so tests can recompute expectations directly
//! from the generator formula.

use hazard_common::{CoordinateAxis, YearlyGrid};

/// Latitude axis starting at 10°N with 0.25° spacing.
pub fn test_lat_axis(ny: usize) -> CoordinateAxis {
    CoordinateAxis::regular("lat", 10.0, 0.25, ny).expect("valid lat axis")
}

/// Longitude axis starting at 30°E with 0.25° spacing.
pub fn test_lon_axis(nx: usize) -> CoordinateAxis {
    CoordinateAxis::regular("lon", 30.0, 0.25, nx).expect("valid lon axis")
}

/// Build a yearly grid by evaluating `f(t, row, col)` for every sample.
pub fn daily_grid_from_fn(
    quantity: &str,
    year: i32,
    lat: CoordinateAxis,
    lon: CoordinateAxis,
    time_len: usize,
    f: impl Fn(usize, usize, usize) -> f32,
) -> YearlyGrid {
    let (ny, nx) = (lat.len(), lon.len());
    let mut data = Vec::with_capacity(time_len * ny * nx);
    for t in 0..time_len {
        for row in 0..ny {
            for col in 0..nx {
                data.push(f(t, row, col));
            }
        }
    }
    YearlyGrid::new(quantity, year, lat, lon, time_len, data).expect("consistent grid shape")
}

/// Daily temperature in Kelvin following a seasonal cycle.
///
/// `value(t, row, col) = 295 + 15·sin(π·t / time_len) + 1.5·row + 0.5·col + 0.3·(year mod 7)`,
/// which peaks around 311K mid-year so some days exceed 32°C.
pub fn daily_temperature_grid(
    quantity: &str,
    year: i32,
    nx: usize,
    ny: usize,
    time_len: usize,
) -> YearlyGrid {
    let year_offset = year.rem_euclid(7) as f32 * 0.3;
    daily_grid_from_fn(
        quantity,
        year,
        test_lat_axis(ny),
        test_lon_axis(nx),
        time_len,
        |t, row, col| {
            let season = (std::f32::consts::PI * t as f32 / time_len.max(1) as f32).sin();
            295.0 + 15.0 * season + 1.5 * row as f32 + 0.5 * col as f32 + year_offset
        },
    )
}

/// Daily near-surface relative humidity in percent (20% to 90%).
pub fn daily_humidity_grid(year: i32, nx: usize, ny: usize, time_len: usize) -> YearlyGrid {
    daily_grid_from_fn(
        "hurs",
        year,
        test_lat_axis(ny),
        test_lon_axis(nx),
        time_len,
        |t, row, col| {
            let phase = (t + 3 * row + 5 * col) % 8;
            20.0 + 10.0 * phase as f32
        },
    )
}

/// A single-cell grid with the given daily series.
pub fn single_cell_grid(quantity: &str, year: i32, series: &[f32]) -> YearlyGrid {
    daily_grid_from_fn(
        quantity,
        year,
        test_lat_axis(1),
        test_lon_axis(1),
        series.len(),
        |t, _, _| series[t],
    )
}
