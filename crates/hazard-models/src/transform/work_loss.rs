//! Labour capacity lost to heat stress.
//!
//! Wet-bulb globe temperature is approximated from air temperature and
//! relative humidity, then mapped to a work-ability fraction by a logistic
//! curve whose parameters depend on work intensity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::degree_days::KELVIN_OFFSET;
use super::{AnnualReduction, IndicatorTransform};

const QUANTITIES: [&str; 2] = ["tas", "hurs"];

/// Physical intensity of the work being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkIntensity {
    Low,
    Medium,
    High,
}

impl WorkIntensity {
    pub const ALL: [WorkIntensity; 3] = [Self::Low, Self::Medium, Self::High];

    /// Logistic curve parameters `(a1, a2)`.
    pub fn parameters(&self) -> (f64, f64) {
        match self {
            Self::Low => (32.98, 17.81),
            Self::Medium => (30.94, 16.64),
            Self::High => (24.64, 22.72),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for WorkIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkIntensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown work intensity '{}'", other)),
        }
    }
}

/// Wet-bulb globe temperature (°C) from air temperature (°C) and relative humidity (%).
pub fn wbgt(tas_c: f64, hurs_pct: f64) -> f64 {
    let vapour_pressure = hurs_pct / 100.0 * 6.105 * (17.27 * tas_c / (237.7 + tas_c)).exp();
    0.567 * tas_c + 0.393 * vapour_pressure + 3.94
}

/// Fraction of labour capacity lost on one day, between 0 and 0.9.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkLoss {
    intensity: WorkIntensity,
}

impl WorkLoss {
    pub fn new(intensity: WorkIntensity) -> Self {
        Self { intensity }
    }

    pub fn intensity(&self) -> WorkIntensity {
        self.intensity
    }
}

impl IndicatorTransform for WorkLoss {
    fn indicator_id(&self) -> String {
        format!("mean_work_loss_{}", self.intensity)
    }

    fn units(&self) -> &str {
        "fractional loss"
    }

    fn quantities(&self) -> &[&'static str] {
        &QUANTITIES
    }

    fn daily_value(&self, inputs: &[f64]) -> f64 {
        let (tas, hurs) = (inputs[0], inputs[1]);
        if tas.is_nan() || hurs.is_nan() {
            return f64::NAN;
        }
        let (a1, a2) = self.intensity.parameters();
        // Below 0 the power is undefined; capacity is unaffected there anyway.
        let wbgt = wbgt(tas - KELVIN_OFFSET, hurs).max(0.0);
        let work_ability = 0.1 + 0.9 / (1.0 + (wbgt / a1).powf(a2));
        1.0 - work_ability
    }

    fn reduction(&self) -> AnnualReduction {
        AnnualReduction::Mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_wbgt() {
        assert_approx_eq!(wbgt(30.0, 50.0), 29.2594, 1e-3);
    }

    #[test]
    fn test_daily_loss_by_intensity() {
        let hot = [303.15, 50.0];
        assert_approx_eq!(WorkLoss::new(WorkIntensity::Low).daily_value(&hot), 0.09544, 1e-4);
        assert_approx_eq!(WorkLoss::new(WorkIntensity::Medium).daily_value(&hot), 0.25476, 1e-4);
        assert_approx_eq!(WorkLoss::new(WorkIntensity::High).daily_value(&hot), 0.88221, 1e-4);
    }

    #[test]
    fn test_cold_and_missing_days() {
        let wl = WorkLoss::new(WorkIntensity::Medium);
        assert_eq!(wl.daily_value(&[243.15, 50.0]), 0.0);
        assert!(wl.daily_value(&[f64::NAN, 50.0]).is_nan());
        assert!(wl.daily_value(&[300.0, f64::NAN]).is_nan());
    }

    #[test]
    fn test_intensity_parse_and_id() {
        assert_eq!("HIGH".parse::<WorkIntensity>().unwrap(), WorkIntensity::High);
        assert!("extreme".parse::<WorkIntensity>().is_err());
        assert_eq!(
            WorkLoss::new(WorkIntensity::Low).indicator_id(),
            "mean_work_loss_low"
        );
    }
}
