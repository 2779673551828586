//! Batch engine behaviour: isolation between items, parallel dispatch and
//! end-to-end runs against the Zarr source and store.

use std::collections::BTreeMap;

use hazard_common::{BatchItem, DerivedGrid, WindowSpec};
use hazard_models::{
    item_path, run_all, run_items, run_single, BatchTransform, DegreeDays, IndicatorModel,
    ModelError, WorkerPool,
};
use hazard_sources::{MemorySource, ZarrYearSource, ZarrYearWriter};
use hazard_store::{
    GridWriteResult, MemoryGridStore, ReadGrid, StoreError, WriteGrid, ZarrGridStore,
};
use test_utils::{
    assert_approx_eq, create_test_datasets, daily_temperature_grid, temp_store_dir, TEST_GCM,
    TEST_SCENARIO,
};

fn degree_days(gcms: &[&str], central_years: Vec<i32>) -> IndicatorModel<DegreeDays> {
    IndicatorModel::new(
        DegreeDays::default(),
        WindowSpec::centered(2).unwrap(),
        gcms.iter().map(|g| g.to_string()).collect(),
        vec![TEST_SCENARIO.to_string()],
        central_years,
    )
}

/// Two gcms with slightly different data, 2028..=2031 each.
fn two_gcm_source() -> MemorySource {
    let mut source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    for (year, days) in [(2028, 365), (2029, 360), (2030, 365), (2031, 366)] {
        source.insert(
            "ACCESS-CM2",
            TEST_SCENARIO,
            daily_temperature_grid("tasmax", year, 4, 3, days),
        );
    }
    source
}

fn stored_grids(store: &MemoryGridStore) -> BTreeMap<String, DerivedGrid> {
    store
        .paths()
        .into_iter()
        .map(|path| {
            let grid = store.read(&path).unwrap();
            (path, grid)
        })
        .collect()
}

/// Store that rejects writes to one path.
struct RejectingStore {
    inner: MemoryGridStore,
    reject: String,
}

impl WriteGrid for RejectingStore {
    fn write(&self, path: &str, grid: &DerivedGrid) -> hazard_store::Result<GridWriteResult> {
        if path == self.reject {
            return Err(StoreError::Io("disk full".to_string()));
        }
        self.inner.write(path, grid)
    }
}

#[test]
fn test_failed_item_does_not_stop_batch() {
    let source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    let target = MemoryGridStore::new();
    // 2035 needs 2034 and 2035, which the source does not have.
    let model = degree_days(&[TEST_GCM], vec![2029, 2035, 2030]);

    let report = run_all(&model, &source, &target, None);
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].item, BatchItem::new(TEST_GCM, TEST_SCENARIO, 2035));
    assert!(report.failed[0].error.contains("2034"));

    assert_eq!(target.len(), 2);
    assert!(!target.exists(&report.failed[0].path).unwrap());
    assert_eq!(source.open_handles(), 0);
    assert!(matches!(
        report.into_result(),
        Err(ModelError::BatchFailed { failed: 1, total: 3, .. })
    ));
}

#[test]
fn test_partial_window_writes_nothing() {
    // 2031 is present but 2032 is not: the window for 2032 must not be written.
    let source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    let target = MemoryGridStore::new();
    let model = degree_days(&[TEST_GCM], vec![2032]);

    let item = BatchItem::new(TEST_GCM, TEST_SCENARIO, 2032);
    let err = run_single(&model, &item, &source, &target, None).unwrap_err();
    assert!(matches!(err, ModelError::Source(_)));
    assert!(target.is_empty());
    assert_eq!(source.open_handles(), 0);
}

#[test]
fn test_inconsistent_window_is_reported() {
    let mut source = MemorySource::new();
    source.insert(TEST_GCM, TEST_SCENARIO, daily_temperature_grid("tasmax", 2029, 4, 3, 365));
    source.insert(TEST_GCM, TEST_SCENARIO, daily_temperature_grid("tasmax", 2030, 2, 2, 365));
    let target = MemoryGridStore::new();
    let model = degree_days(&[TEST_GCM], vec![2030]);

    let item = BatchItem::new(TEST_GCM, TEST_SCENARIO, 2030);
    let err = run_single(&model, &item, &source, &target, None).unwrap_err();
    assert!(matches!(err, ModelError::InconsistentWindow { year: 2030, .. }));
    assert!(target.is_empty());
}

#[test]
fn test_run_single_on_worker_pool() {
    let source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    let model = degree_days(&[TEST_GCM], vec![2030]);
    let item = BatchItem::new(TEST_GCM, TEST_SCENARIO, 2030);

    let sequential = MemoryGridStore::new();
    run_single(&model, &item, &source, &sequential, None).unwrap();

    let pool = WorkerPool::new(2).unwrap();
    let pooled = MemoryGridStore::new();
    let success = run_single(&model, &item, &source, &pooled, Some(&pool)).unwrap();
    assert_eq!(success.item, item);
    assert_eq!(success.path, item_path(&model, &item));
    assert_eq!(stored_grids(&pooled), stored_grids(&sequential));

    let missing = BatchItem::new(TEST_GCM, TEST_SCENARIO, 2035);
    assert!(run_single(&model, &missing, &source, &pooled, Some(&pool)).is_err());
    assert_eq!(source.open_handles(), 0);
}

#[test]
fn test_write_failure_is_isolated() {
    let source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    let model = degree_days(&[TEST_GCM], vec![2029, 2030, 2031]);
    let rejected = BatchItem::new(TEST_GCM, TEST_SCENARIO, 2030);
    let target = RejectingStore {
        inner: MemoryGridStore::new(),
        reject: model.item_path(&rejected),
    };

    let report = run_all(&model, &source, &target, None);
    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].item, rejected);
    assert!(report.failed[0].error.contains("disk full"));
    assert_eq!(target.inner.len(), 2);
}

#[test]
fn test_order_does_not_change_results() {
    let source = two_gcm_source();
    let model = degree_days(&[TEST_GCM, "ACCESS-CM2"], vec![2029, 2030, 2031]);
    let items = model.batch_items();
    assert_eq!(items.len(), 6);

    let forward = MemoryGridStore::new();
    run_items(&model, &items, &source, &forward, None)
        .into_result()
        .unwrap();

    let reversed_items: Vec<_> = items.iter().rev().cloned().collect();
    let reversed = MemoryGridStore::new();
    let report = run_items(&model, &reversed_items, &source, &reversed, None);
    assert_eq!(report.completed[0].item, reversed_items[0]);

    assert_eq!(stored_grids(&forward), stored_grids(&reversed));
}

#[test]
fn test_worker_pool_matches_sequential() {
    let source = two_gcm_source();
    let model = degree_days(&[TEST_GCM, "ACCESS-CM2"], vec![2029, 2030, 2031]);

    let sequential = MemoryGridStore::new();
    let seq_report = run_all(&model, &source, &sequential, None);

    let pool = WorkerPool::new(4).unwrap();
    let parallel = MemoryGridStore::new();
    let par_report = run_all(&model, &source, &parallel, Some(&pool));

    assert!(par_report.is_success());
    let seq_items: Vec<_> = seq_report.completed.iter().map(|s| &s.item).collect();
    let par_items: Vec<_> = par_report.completed.iter().map(|s| &s.item).collect();
    assert_eq!(seq_items, par_items);
    assert_eq!(stored_grids(&sequential), stored_grids(&parallel));
    assert_eq!(source.open_handles(), 0);
}

#[test]
fn test_duplicate_items_run_once() {
    let source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    let target = MemoryGridStore::new();
    let model = degree_days(&[TEST_GCM], vec![2030]);
    let item = BatchItem::new(TEST_GCM, TEST_SCENARIO, 2030);

    let report = run_items(&model, &[item.clone(), item.clone()], &source, &target, None);
    assert_eq!(report.total(), 1);
    assert_eq!(report.written_paths(), vec![item_path(&model, &item).as_str()]);
}

#[test]
fn test_empty_configuration_runs_nothing() {
    let source = MemorySource::new();
    let target = MemoryGridStore::new();
    let model = degree_days(&[], vec![2030]);

    let report = run_all(&model, &source, &target, None);
    assert!(report.is_success());
    assert_eq!(report.total(), 0);
    assert!(target.is_empty());
}

#[test]
fn test_rerun_overwrites_same_path() {
    let source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    let target = MemoryGridStore::new();
    let model = degree_days(&[TEST_GCM], vec![2030]);

    run_all(&model, &source, &target, None).into_result().unwrap();
    let first = stored_grids(&target);
    run_all(&model, &source, &target, None).into_result().unwrap();
    assert_eq!(target.len(), 1);
    assert_eq!(stored_grids(&target), first);
}

#[test]
fn test_end_to_end_with_zarr_source_and_store() {
    let source_dir = temp_store_dir();
    let target_dir = temp_store_dir();

    let writer = ZarrYearWriter::new(source_dir.path()).unwrap();
    for grid in create_test_datasets() {
        writer.write(TEST_GCM, TEST_SCENARIO, &grid).unwrap();
    }
    let source = ZarrYearSource::new(source_dir.path()).unwrap();
    let target = ZarrGridStore::new(target_dir.path()).unwrap();
    let model = degree_days(&[TEST_GCM], vec![2029, 2030, 2031]);
    let pool = WorkerPool::new(2).unwrap();

    let report = run_all(&model, &source, &target, Some(&pool));
    assert!(report.is_success(), "{:?}", report.failed);
    assert_eq!(source.open_handles(), 0);

    // The same computation against the in-memory backends gives the same grids.
    let memory_source = MemorySource::from_grids(TEST_GCM, TEST_SCENARIO, create_test_datasets());
    let memory_target = MemoryGridStore::new();
    run_all(&model, &memory_source, &memory_target, None)
        .into_result()
        .unwrap();

    for path in memory_target.paths() {
        let expected = memory_target.read(&path).unwrap();
        assert_eq!(target.read(&path).unwrap(), expected);

        // Sample the grid at every cell's exact coordinates.
        let (rows, cols) = expected.shape();
        let mut x = Vec::new();
        let mut y = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                x.push(expected.lon().values()[col]);
                y.push(expected.lat().values()[row]);
            }
        }
        let sampled = target.read_floored(&path, &x, &y).unwrap();
        for (value, want) in sampled.iter().zip(expected.data()) {
            assert_approx_eq!(*value, *want, 0.0);
        }
    }
}
