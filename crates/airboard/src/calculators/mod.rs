//! Classroom air-quality calculators.
//!
//! Small linear and lookup-table estimators whose coefficients come from
//! configuration:
//!
//! - [`health`]: headache and concentration effects of lower PM2.5.
//! - [`alert`]: today's action guide from indoor and outdoor readings.
//! - [`plants`]: CO₂ absorption and humidity effect of classroom plants.
//! - [`risk`]: a respiratory risk score from exposure and habits.
//!
//! Settings are validated against their allowed ranges with
//! [`CalculatorSettings::validate`]; per-call inputs are checked by each
//! calculator and rejected with [`Error::InvalidInput`].

pub mod alert;
pub mod health;
pub mod plants;
pub mod risk;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use alert::AlertSettings;
pub use health::HealthSettings;
pub use plants::PlantSettings;
pub use risk::RiskSettings;

/// Coefficients for every calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorSettings {
    /// Health-effect estimator.
    pub health: HealthSettings,
    /// Air-quality alert thresholds.
    pub alert: AlertSettings,
    /// Plant effect coefficients.
    pub plants: PlantSettings,
    /// Risk score thresholds.
    pub risk: RiskSettings,
}

impl CalculatorSettings {
    /// Validate every calculator's settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] naming the first value out of range.
    pub fn validate(&self) -> Result<()> {
        self.health.validate()?;
        self.alert.validate()?;
        self.plants.validate()?;
        self.risk.validate()
    }
}

/// Check a setting against its inclusive range.
pub(crate) fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::config_validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )))
    }
}

/// Check that a measurement is finite and not negative.
pub(crate) fn check_measurement(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{field} must be a non-negative number, got {value}"
        )))
    }
}

/// Round to two decimal places.
///
/// Ties round away from zero (`0.125` -> `0.13`), not half-to-even.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(CalculatorSettings::default().validate().is_ok());
    }

    #[test]
    fn test_check_range() {
        assert!(check_range("x", 0.5, 0.5, 2.0).is_ok());
        assert!(check_range("x", 2.0, 0.5, 2.0).is_ok());

        let err = check_range("x", 2.5, 0.5, 2.0).unwrap_err();
        assert!(err.to_string().contains("x must be between 0.5 and 2"));
    }

    #[test]
    fn test_check_measurement() {
        assert!(check_measurement("pm", 0.0).is_ok());
        assert!(matches!(
            check_measurement("pm", -1.0),
            Err(Error::InvalidInput { .. })
        ));
        assert!(check_measurement("pm", f64::NAN).is_err());
    }

    #[test]
    fn test_round2() {
        assert!((round2(1.234_56) - 1.23).abs() < 1e-9);
        assert!((round2(8.0) - 8.0).abs() < 1e-9);
        assert!((round2(0.125) - 0.13).abs() < 1e-9);
        assert!((round2(-0.125) + 0.13).abs() < 1e-9);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = CalculatorSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: CalculatorSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, parsed);
    }
}
