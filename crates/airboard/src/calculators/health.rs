//! Health and learning effects of cleaner classroom air.

use serde::{Deserialize, Serialize};

use super::{check_measurement, check_range, round2};
use crate::error::{Error, Result};

/// Estimator coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Headache rate reduction, in percentage points per µg/m³ of PM2.5 removed.
    pub reduction_per_ug: f64,
    /// Scale applied to the relative PM2.5 improvement.
    pub concentration_factor: f64,
    /// Minutes of effective study gained per percent of concentration.
    pub study_time_factor: f64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            reduction_per_ug: 0.4,
            concentration_factor: 1.0,
            study_time_factor: 0.3,
        }
    }
}

impl HealthSettings {
    /// Validate against the allowed ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if a coefficient is out of range.
    pub fn validate(&self) -> Result<()> {
        check_range("health.reduction_per_ug", self.reduction_per_ug, 0.1, 1.0)?;
        check_range("health.concentration_factor", self.concentration_factor, 0.5, 2.0)?;
        check_range("health.study_time_factor", self.study_time_factor, 0.1, 1.0)
    }
}

/// Classroom readings before and after an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthInput {
    /// Current PM2.5 in µg/m³.
    pub baseline_pm: f64,
    /// Expected PM2.5 after the improvement, in µg/m³.
    pub improved_pm: f64,
    /// Current headache rate, in percent.
    pub baseline_headache: f64,
}

/// Estimated effects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthEstimate {
    /// PM2.5 removed, in µg/m³ (never negative).
    pub pm_reduction: f64,
    /// Drop in headache rate, percentage points, two decimals.
    pub headache_reduction: f64,
    /// Headache rate afterwards, percent, two decimals.
    pub headache_after: f64,
    /// Concentration improvement, percent.
    pub concentration_gain: f64,
    /// Effective study time gained, minutes per day.
    pub study_minutes: f64,
}

/// Estimate the effects of lowering classroom PM2.5.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a reading is negative or the headache
/// rate is above 100%.
pub fn estimate(input: &HealthInput, settings: &HealthSettings) -> Result<HealthEstimate> {
    check_measurement("baseline PM2.5", input.baseline_pm)?;
    check_measurement("improved PM2.5", input.improved_pm)?;
    check_measurement("headache rate", input.baseline_headache)?;
    if input.baseline_headache > 100.0 {
        return Err(Error::invalid_input(format!(
            "headache rate must be at most 100%, got {}",
            input.baseline_headache
        )));
    }

    let delta = (input.baseline_pm - input.improved_pm).max(0.0);
    let headache_reduction = round2(input.baseline_headache.min(delta * settings.reduction_per_ug));
    let headache_after = round2((input.baseline_headache - headache_reduction).max(0.0));

    let concentration_gain = if input.baseline_pm > 0.0 {
        (delta / input.baseline_pm * 100.0 * settings.concentration_factor).max(0.0)
    } else {
        0.0
    };

    Ok(HealthEstimate {
        pm_reduction: delta,
        headache_reduction,
        headache_after,
        concentration_gain,
        study_minutes: concentration_gain * settings.study_time_factor,
    })
}
