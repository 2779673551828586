//! Climate hazard indicators and the batch engine that computes them.
//!
//! A model enumerates independent items (gcm × scenario × central year),
//! computes each item's window-averaged indicator grid from yearly datasets,
//! and the engine writes one grid per item to a store:
//!
//! ```text
//! batch_items() -> item -> process_item(item, source) -> target.write(item_path(item), grid)
//! ```
//!
//! Indicators:
//! - [`DegreeDays`]: annual degree days of `tasmax` above a threshold
//! - [`WorkLoss`]: mean labour capacity lost to heat stress, from `tas` and `hurs`

pub mod engine;
pub mod enumerate;
pub mod error;
pub mod model;
pub mod pool;
pub mod report;
pub mod transform;

pub use engine::{item_path, run_all, run_items, run_single};
pub use enumerate::{dedup_items, enumerate_items};
pub use error::{ModelError, Result};
pub use model::{indicator_path, BatchTransform, IndicatorModel, DEFAULT_PATH_PREFIX};
pub use pool::WorkerPool;
pub use report::{ItemFailure, ItemSuccess, RunReport};
pub use transform::{
    AnnualReduction, DegreeDays, IndicatorTransform, WindowAccumulator, WorkIntensity, WorkLoss,
};
