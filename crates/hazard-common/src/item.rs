//! Batch work items and aggregation windows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// One independent unit of work: a (gcm, scenario, central year) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchItem {
    pub gcm: String,
    pub scenario: String,
    pub central_year: i32,
}

impl BatchItem {
    pub fn new(gcm: impl Into<String>, scenario: impl Into<String>, central_year: i32) -> Self {
        Self {
            gcm: gcm.into(),
            scenario: scenario.into(),
            central_year,
        }
    }
}

impl fmt::Display for BatchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.gcm, self.scenario, self.central_year)
    }
}

impl std::str::FromStr for BatchItem {
    type Err = GridError;

    /// Parse `GCM/SCENARIO/YEAR`.
    fn from_str(s: &str) -> GridResult<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let [gcm, scenario, year] = parts.as_slice() else {
            return Err(GridError::invalid_identifier(s, "expected GCM/SCENARIO/YEAR"));
        };
        validate_identifier(gcm)?;
        validate_identifier(scenario)?;
        let central_year = year
            .parse()
            .map_err(|_| GridError::invalid_identifier(*year, "year is not an integer"))?;
        Ok(Self::new(*gcm, *scenario, central_year))
    }
}

/// How the window is positioned relative to the central year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAlignment {
    /// `window_years` years straddling the central year; even windows lean
    /// towards the past (a 2-year window on Y is `[Y-1, Y]`).
    #[default]
    Centered,
    /// `window_years` years ending at the central year.
    Trailing,
}

/// Longest window accepted by [`WindowSpec::new`].
pub const MAX_WINDOW_YEARS: u32 = 1000;

/// Number of consecutive years averaged for one item, and their placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub window_years: u32,
    #[serde(default)]
    pub alignment: WindowAlignment,
}

impl WindowSpec {
    pub fn new(window_years: u32, alignment: WindowAlignment) -> GridResult<Self> {
        if window_years == 0 {
            return Err(GridError::InvalidWindow("window_years must be > 0".to_string()));
        }
        if window_years > MAX_WINDOW_YEARS {
            return Err(GridError::InvalidWindow(format!(
                "window_years must be <= {}, got {}",
                MAX_WINDOW_YEARS, window_years
            )));
        }
        Ok(Self {
            window_years,
            alignment,
        })
    }

    pub fn centered(window_years: u32) -> GridResult<Self> {
        Self::new(window_years, WindowAlignment::Centered)
    }

    pub fn trailing(window_years: u32) -> GridResult<Self> {
        Self::new(window_years, WindowAlignment::Trailing)
    }

    /// Contributing years for `central_year`, in ascending order.
    ///
    /// Fails when the window is empty or runs past the representable years.
    pub fn years(&self, central_year: i32) -> GridResult<Vec<i32>> {
        let out_of_range = || {
            GridError::InvalidWindow(format!(
                "{}-year window around {} is out of range",
                self.window_years, central_year
            ))
        };
        let window = i32::try_from(self.window_years)
            .ok()
            .filter(|w| *w > 0)
            .ok_or_else(out_of_range)?;
        let first = match self.alignment {
            WindowAlignment::Centered => central_year.checked_sub(window / 2),
            WindowAlignment::Trailing => central_year.checked_sub(window - 1),
        }
        .ok_or_else(out_of_range)?;
        let last = first.checked_add(window - 1).ok_or_else(out_of_range)?;
        Ok((first..=last).collect())
    }
}

/// Check that a gcm, scenario or quantity name is safe to embed in a path segment.
pub fn validate_identifier(value: &str) -> GridResult<()> {
    if value.is_empty() {
        return Err(GridError::invalid_identifier(value, "must not be empty"));
    }
    if value.starts_with('.') {
        return Err(GridError::invalid_identifier(value, "must not start with '.'"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(GridError::invalid_identifier(
            value,
            format!("character '{}' is not allowed", c),
        ));
    }
    Ok(())
}
