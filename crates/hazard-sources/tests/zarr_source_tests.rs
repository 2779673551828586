//! Integration tests: write yearly grids with ZarrYearWriter and read them
//! back through the OpenDataset capability.

use hazard_common::{CoordinateAxis, YearlyGrid};
use hazard_sources::{ChunkHint, OpenDataset, SourceError, ZarrYearSource, ZarrYearWriter};
use test_utils::daily_temperature_grid;

fn write_years(root: &std::path::Path) -> Vec<YearlyGrid> {
    let writer = ZarrYearWriter::new(root)
        .expect("Failed to create writer")
        .with_time_chunk(16);
    let grids = vec![
        daily_temperature_grid("tasmax", 2029, 4, 3, 365),
        daily_temperature_grid("tasmax", 2030, 4, 3, 360),
    ];
    for grid in &grids {
        writer
            .write("NorESM2-MM", "ssp585", grid)
            .expect("Failed to write year");
    }
    grids
}

#[test]
fn test_zarr_year_roundtrip() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let grids = write_years(temp_dir.path());

    let source = ZarrYearSource::new(temp_dir.path()).expect("Failed to open source");
    for expected in &grids {
        let ds = source
            .open_dataset_year("NorESM2-MM", "ssp585", "tasmax", expected.year(), None)
            .expect("Failed to open year");
        assert_eq!(ds.shape(), expected.shape());
        assert_eq!(ds.lat(), expected.lat());
        assert_eq!(ds.lon(), expected.lon());
        assert_eq!(ds.data(), expected.data());
        assert_eq!(source.open_handles(), 1);
    }
    assert_eq!(source.open_handles(), 0);
}

#[test]
fn test_chunk_hint_reads_same_values() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let grids = write_years(temp_dir.path());
    let source = ZarrYearSource::new(temp_dir.path()).expect("Failed to open source");

    // 7 does not divide 360, so the last slab is partial.
    let ds = source
        .open_dataset_year(
            "NorESM2-MM",
            "ssp585",
            "tasmax",
            2030,
            Some(ChunkHint::time_steps(7)),
        )
        .expect("Failed to open year");
    assert_eq!(ds.time_len(), 360);
    assert_eq!(ds.data(), grids[1].data());
}

#[test]
fn test_missing_year_is_not_found() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_years(temp_dir.path());
    let source = ZarrYearSource::new(temp_dir.path()).expect("Failed to open source");

    let err = source
        .open_dataset_year("NorESM2-MM", "ssp585", "tasmax", 2031, None)
        .unwrap_err();
    assert!(matches!(err, SourceError::NotFound { year: 2031, .. }));

    let err = source
        .open_dataset_year("../etc", "ssp585", "tasmax", 2030, None)
        .unwrap_err();
    assert!(matches!(err, SourceError::Grid(_)));
    assert_eq!(source.open_handles(), 0);
}

#[test]
fn test_gcms_lists_model_directories() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_years(temp_dir.path());

    let lat = CoordinateAxis::new("lat", vec![0.0]).unwrap();
    let lon = CoordinateAxis::new("lon", vec![0.0]).unwrap();
    let grid = YearlyGrid::new("tasmax", 2030, lat, lon, 1, vec![300.0]).unwrap();
    ZarrYearWriter::new(temp_dir.path())
        .unwrap()
        .write("ACCESS-CM2", "ssp585", &grid)
        .unwrap();

    let source = ZarrYearSource::new(temp_dir.path()).expect("Failed to open source");
    assert_eq!(
        source.gcms(),
        vec!["ACCESS-CM2".to_string(), "NorESM2-MM".to_string()]
    );
}

#[test]
fn test_rewrite_replaces_year() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_years(temp_dir.path());

    let replacement = daily_temperature_grid("tasmax", 2030, 2, 2, 10);
    ZarrYearWriter::new(temp_dir.path())
        .unwrap()
        .write("NorESM2-MM", "ssp585", &replacement)
        .unwrap();

    let source = ZarrYearSource::new(temp_dir.path()).unwrap();
    let ds = source
        .open_dataset_year("NorESM2-MM", "ssp585", "tasmax", 2030, None)
        .unwrap();
    assert_eq!(ds.shape(), [10, 2, 2]);
    assert_eq!(ds.data(), replacement.data());
}
