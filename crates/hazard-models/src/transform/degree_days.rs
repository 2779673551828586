//! Degree days above a temperature threshold.

use super::{AnnualReduction, IndicatorTransform};

/// 0 °C in Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

const QUANTITIES: [&str; 1] = ["tasmax"];

/// Annual degree days of daily maximum temperature above a threshold.
///
/// Daily excess is `max(tasmax - threshold, 0)`; the year total is rescaled
/// to a 365-day calendar so 360-day and leap-year models are comparable.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeDays {
    threshold_k: f64,
}

impl DegreeDays {
    /// Default threshold: 32 °C.
    pub const DEFAULT_THRESHOLD_K: f64 = 32.0 + KELVIN_OFFSET;

    pub fn new(threshold_k: f64) -> Self {
        Self { threshold_k }
    }

    pub fn threshold_k(&self) -> f64 {
        self.threshold_k
    }

    /// Threshold in °C, rounded to one decimal, as it appears in the indicator id.
    fn threshold_label(&self) -> String {
        let celsius = ((self.threshold_k - KELVIN_OFFSET) * 10.0).round() / 10.0;
        if celsius.fract() == 0.0 {
            format!("{:.0}", celsius)
        } else {
            format!("{:.1}", celsius).replace('.', "p")
        }
    }
}

impl Default for DegreeDays {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD_K)
    }
}

impl IndicatorTransform for DegreeDays {
    fn indicator_id(&self) -> String {
        format!("mean_degree_days_above_{}c", self.threshold_label())
    }

    fn units(&self) -> &str {
        "degree days"
    }

    fn quantities(&self) -> &[&'static str] {
        &QUANTITIES
    }

    fn daily_value(&self, inputs: &[f64]) -> f64 {
        let tasmax = inputs[0];
        if tasmax.is_nan() {
            return 0.0;
        }
        (tasmax - self.threshold_k).max(0.0)
    }

    fn reduction(&self) -> AnnualReduction {
        AnnualReduction::annual_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::annualize;
    use test_utils::{assert_approx_eq, single_cell_grid};

    #[test]
    fn test_indicator_id() {
        assert_eq!(
            DegreeDays::default().indicator_id(),
            "mean_degree_days_above_32c"
        );
        assert_eq!(
            DegreeDays::new(35.5 + KELVIN_OFFSET).indicator_id(),
            "mean_degree_days_above_35p5c"
        );
    }

    #[test]
    fn test_daily_excess() {
        let dd = DegreeDays::default();
        assert_eq!(dd.daily_value(&[300.0]), 0.0);
        assert_approx_eq!(dd.daily_value(&[310.15]), 5.0, 1e-9);
        assert_eq!(dd.daily_value(&[f64::NAN]), 0.0);
    }

    #[test]
    fn test_annual_total_rescaled() {
        // 10 hot days at +2K in a 360-day year.
        let mut series = vec![290.0f32; 360];
        for v in series.iter_mut().take(10) {
            *v = 307.15;
        }
        let grid = single_cell_grid("tasmax", 2030, &series);
        let annual = annualize(&DegreeDays::default(), 2030, &[&grid]).unwrap();
        assert_approx_eq!(annual[0], 20.0 * 365.0 / 360.0, 1e-3);
    }
}
