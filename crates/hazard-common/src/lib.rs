//! Common types shared across the climate hazard crates.
//!
//! - [`CoordinateAxis`]: a strictly monotonic 1-D coordinate with floored lookup
//! - [`YearlyGrid`]: one year of daily values (time × lat × lon)
//! - [`DerivedGrid`]: an aggregated 2-D indicator grid (lat × lon)
//! - [`BatchItem`] / [`WindowSpec`]: units of work and their aggregation window

pub mod axis;
pub mod error;
pub mod grid;
pub mod item;

pub use axis::{AxisDirection, CoordinateAxis};
pub use error::{GridError, GridResult};
pub use grid::{DerivedGrid, YearlyGrid};
pub use item::{validate_identifier, BatchItem, WindowAlignment, WindowSpec, MAX_WINDOW_YEARS};
