//! Batch execution: compute each item and write its grid to the target.
//!
//! Items are independent. Each one opens its own years, computes its grid
//! and performs exactly one write; a failure is recorded against that item
//! and the rest of the batch carries on.

use std::time::Instant;

use metrics::{counter, histogram};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use hazard_common::BatchItem;
use hazard_sources::OpenDataset;
use hazard_store::WriteGrid;

use crate::enumerate::dedup_items;
use crate::error::Result;
use crate::model::BatchTransform;
use crate::pool::WorkerPool;
use crate::report::{ItemFailure, ItemSuccess, RunReport};

/// Storage path of an item's result under `transform`.
pub fn item_path(transform: &dyn BatchTransform, item: &BatchItem) -> String {
    transform.item_path(item)
}

/// Compute and persist every item the transform enumerates.
#[instrument(skip_all, fields(indicator = %transform.id()))]
pub fn run_all(
    transform: &dyn BatchTransform,
    source: &dyn OpenDataset,
    target: &dyn WriteGrid,
    client: Option<&WorkerPool>,
) -> RunReport {
    let items = transform.batch_items();
    run_items(transform, &items, source, target, client)
}

/// Compute and persist exactly one item, propagating its error.
///
/// With a worker pool the item runs on one of its threads, so work nested
/// inside the transform shares the pool's thread budget.
#[instrument(skip(transform, source, target, client), fields(indicator = %transform.id()))]
pub fn run_single(
    transform: &dyn BatchTransform,
    item: &BatchItem,
    source: &dyn OpenDataset,
    target: &dyn WriteGrid,
    client: Option<&WorkerPool>,
) -> Result<ItemSuccess> {
    let result = match client {
        Some(pool) => pool.install(|| execute_item(transform, item, source, target)),
        None => execute_item(transform, item, source, target),
    };
    record_outcome(transform, item, &result);
    result
}

/// Compute and persist the given items.
///
/// With a worker pool, items are dispatched across its threads; without one
/// they run in order on the calling thread. Repeated items run once. The
/// report lists outcomes in item order either way.
#[instrument(skip_all, fields(indicator = %transform.id(), items = items.len()))]
pub fn run_items(
    transform: &dyn BatchTransform,
    items: &[BatchItem],
    source: &dyn OpenDataset,
    target: &dyn WriteGrid,
    client: Option<&WorkerPool>,
) -> RunReport {
    let items = dedup_items(items);
    let start = Instant::now();

    let run_one = |item: &BatchItem| {
        let result = execute_item(transform, item, source, target);
        record_outcome(transform, item, &result);
        result.map_err(|e| ItemFailure {
            item: item.clone(),
            path: transform.item_path(item),
            error: e.to_string(),
        })
    };

    let outcomes: Vec<std::result::Result<ItemSuccess, ItemFailure>> = match client {
        Some(pool) => pool.install(|| items.par_iter().map(run_one).collect()),
        None => items.iter().map(run_one).collect(),
    };

    let mut report = RunReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(success) => report.completed.push(success),
            Err(failure) => report.failed.push(failure),
        }
    }

    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        workers = client.map(|p| p.workers()).unwrap_or(1),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch finished"
    );
    report
}

/// Read, compute and write one item. Nothing is written unless the whole
/// window was computed.
fn execute_item(
    transform: &dyn BatchTransform,
    item: &BatchItem,
    source: &dyn OpenDataset,
    target: &dyn WriteGrid,
) -> Result<ItemSuccess> {
    let start = Instant::now();
    let path = transform.item_path(item);
    let grid = transform.process_item(item, source)?;
    let written = target.write(&path, &grid)?;

    Ok(ItemSuccess {
        item: item.clone(),
        path: written.path,
        shape: written.shape,
        bytes_written: written.bytes_written,
        duration: start.elapsed(),
    })
}

fn record_outcome(transform: &dyn BatchTransform, item: &BatchItem, result: &Result<ItemSuccess>) {
    let indicator = transform.id();
    match result {
        Ok(success) => {
            counter!("hazard_items_completed_total", "indicator" => indicator.clone()).increment(1);
            histogram!("hazard_item_duration_seconds", "indicator" => indicator)
                .record(success.duration.as_secs_f64());
            info!(
                gcm = %item.gcm,
                scenario = %item.scenario,
                central_year = item.central_year,
                path = %success.path,
                duration_ms = success.duration.as_millis() as u64,
                "Item completed"
            );
        }
        Err(e) => {
            counter!("hazard_items_failed_total", "indicator" => indicator).increment(1);
            warn!(
                gcm = %item.gcm,
                scenario = %item.scenario,
                central_year = item.central_year,
                error = %e,
                "Item failed"
            );
        }
    }
}
