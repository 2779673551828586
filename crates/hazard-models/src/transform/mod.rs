//! Indicator transforms.
//!
//! Every indicator shares one shape:
//!
//! ```text
//! per-day pointwise function of the input quantities
//!   -> annual reduction over the time axis (one value per cell)
//!   -> elementwise average of the annual grids across the window
//! ```
//!
//! An [`IndicatorTransform`] supplies only the first two steps; the window
//! machinery lives in [`aggregate`].

pub mod aggregate;
pub mod degree_days;
pub mod work_loss;

pub use aggregate::{annualize, AnnualReduction, WindowAccumulator};
pub use degree_days::DegreeDays;
pub use work_loss::{WorkIntensity, WorkLoss};

/// A pointwise daily indicator with its annual reduction.
pub trait IndicatorTransform: Send + Sync {
    /// Identifier used as the indicator segment of storage paths.
    fn indicator_id(&self) -> String;

    /// Units of the annual indicator value.
    fn units(&self) -> &str;

    /// Quantities read for each year, in the order `daily_value` receives them.
    fn quantities(&self) -> &[&'static str];

    /// Combine one cell's inputs for one day into a daily value.
    fn daily_value(&self, inputs: &[f64]) -> f64;

    /// How daily values collapse into one annual value per cell.
    fn reduction(&self) -> AnnualReduction;
}
