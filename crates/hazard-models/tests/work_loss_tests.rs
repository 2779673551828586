//! Work-loss indicator over two input quantities.

use hazard_common::{BatchItem, WindowSpec};
use hazard_models::{
    run_all, BatchTransform, IndicatorModel, IndicatorTransform, WorkIntensity, WorkLoss,
};
use hazard_sources::MemorySource;
use hazard_store::{MemoryGridStore, ReadGrid};
use test_utils::{
    assert_approx_eq, create_work_loss_datasets, single_cell_grid, TEST_GCM, TEST_SCENARIO,
};

fn model(intensity: WorkIntensity, window_years: u32) -> IndicatorModel<WorkLoss> {
    IndicatorModel::new(
        WorkLoss::new(intensity),
        WindowSpec::centered(window_years).unwrap(),
        vec![TEST_GCM.to_string()],
        vec![TEST_SCENARIO.to_string()],
        vec![2030],
    )
}

#[test]
fn test_constant_conditions_give_daily_loss() {
    // Same conditions every day: the annual mean equals the daily value.
    let source = MemorySource::from_grids(
        TEST_GCM,
        TEST_SCENARIO,
        [
            single_cell_grid("tas", 2029, &[303.15; 365]),
            single_cell_grid("hurs", 2029, &[50.0; 365]),
            single_cell_grid("tas", 2030, &[303.15; 360]),
            single_cell_grid("hurs", 2030, &[50.0; 360]),
        ],
    );
    let target = MemoryGridStore::new();
    let model = model(WorkIntensity::Medium, 2);
    run_all(&model, &source, &target, None).into_result().unwrap();

    let path = model.item_path(&BatchItem::new(TEST_GCM, TEST_SCENARIO, 2030));
    assert!(path.contains("mean_work_loss_medium"));
    let grid = target.read(&path).unwrap();
    let daily = model.transform().daily_value(&[303.15, 50.0]);
    assert_approx_eq!(grid.data()[0], daily, 1e-5);
    assert_eq!(grid.attribute("units"), Some("fractional loss"));
}

#[test]
fn test_higher_intensity_loses_more() {
    let source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_work_loss_datasets());
    let mut results = Vec::new();
    for intensity in WorkIntensity::ALL {
        let target = MemoryGridStore::new();
        let model = model(intensity, 3);
        run_all(&model, &source, &target, None).into_result().unwrap();
        let path = model.item_path(&BatchItem::new(TEST_GCM, TEST_SCENARIO, 2030));
        results.push(target.read(&path).unwrap());
    }

    for cell in 0..results[0].data().len() {
        let (low, medium, high) = (
            results[0].data()[cell],
            results[1].data()[cell],
            results[2].data()[cell],
        );
        assert!((0.0..=0.9).contains(&low));
        assert!(low <= medium && medium <= high, "cell {}: {} {} {}", cell, low, medium, high);
    }
}

#[test]
fn test_missing_humidity_fails_item() {
    let source = MemorySource::from_grids(
        TEST_GCM,
        TEST_SCENARIO,
        [single_cell_grid("tas", 2030, &[303.15; 365])],
    );
    let target = MemoryGridStore::new();
    let report = run_all(&model(WorkIntensity::Low, 1), &source, &target, None);
    assert_eq!(report.failed.len(), 1);
    assert!(target.is_empty());
    assert_eq!(source.open_handles(), 0);
}
