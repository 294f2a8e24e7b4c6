//! Today's classroom air-quality alert.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{check_measurement, check_range};
use crate::error::Result;

/// Alert thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Indoor CO₂ requiring immediate ventilation, ppm.
    pub co2_danger: f64,
    /// Indoor CO₂ worth a caution, ppm.
    pub co2_warning: f64,
    /// Indoor PM2.5 considered dangerous, µg/m³.
    pub pm25_danger: f64,
    /// Indoor PM2.5 worth ventilating for, µg/m³.
    pub pm25_warning: f64,
    /// Outdoor PM2.5 at which masks are advised, µg/m³.
    pub outdoor_severe: f64,
    /// Outdoor PM2.5 worth ventilating for, µg/m³.
    pub outdoor_warning: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            co2_danger: 1500.0,
            co2_warning: 1000.0,
            pm25_danger: 75.0,
            pm25_warning: 35.0,
            outdoor_severe: 150.0,
            outdoor_warning: 75.0,
        }
    }
}

impl AlertSettings {
    /// Validate against the allowed ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`](crate::Error::ConfigValidation) if
    /// a threshold is out of range.
    pub fn validate(&self) -> Result<()> {
        check_range("alert.co2_danger", self.co2_danger, 1000.0, 2000.0)?;
        check_range("alert.co2_warning", self.co2_warning, 800.0, 1500.0)?;
        check_range("alert.pm25_danger", self.pm25_danger, 50.0, 200.0)?;
        check_range("alert.pm25_warning", self.pm25_warning, 15.0, 75.0)?;
        check_range("alert.outdoor_severe", self.outdoor_severe, 0.0, 500.0)?;
        check_range("alert.outdoor_warning", self.outdoor_warning, 0.0, 500.0)
    }
}

/// Today's readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertReading {
    /// Outdoor PM2.5, µg/m³.
    pub outdoor_pm: f64,
    /// Classroom PM2.5, µg/m³.
    pub indoor_pm: f64,
    /// Classroom CO₂, ppm.
    pub indoor_co2: f64,
}

/// How urgent the guide is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Act now.
    Danger,
    /// Act soon.
    Warning,
    /// Nothing to do.
    Ok,
}

/// The headline action for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guide {
    /// CO₂ is above the danger threshold.
    VentilateNow,
    /// Indoor and outdoor PM2.5 are both severe.
    WearMask,
    /// PM2.5 is elevated indoors or outdoors.
    Ventilate,
    /// CO₂ is elevated.
    Co2Caution,
    /// Air is fine.
    Good,
}

impl Guide {
    /// How urgent this guide is.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::VentilateNow | Self::WearMask => Severity::Danger,
            Self::Ventilate | Self::Co2Caution => Severity::Warning,
            Self::Good => Severity::Ok,
        }
    }
}

impl fmt::Display for Guide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::VentilateNow => "Ventilate immediately",
            Self::WearMask => "Wear a mask",
            Self::Ventilate => "Ventilate",
            Self::Co2Caution => "CO₂ caution",
            Self::Good => "Good",
        };
        f.write_str(text)
    }
}

/// The alert for a set of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Headline action.
    pub guide: Guide,
    /// Urgency of the headline action.
    pub severity: Severity,
    /// Concrete recommended actions.
    pub actions: Vec<String>,
}

/// Evaluate today's readings.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`](crate::Error::InvalidInput) if a reading
/// is negative.
pub fn evaluate(reading: &AlertReading, settings: &AlertSettings) -> Result<Alert> {
    check_measurement("outdoor PM2.5", reading.outdoor_pm)?;
    check_measurement("indoor PM2.5", reading.indoor_pm)?;
    check_measurement("indoor CO₂", reading.indoor_co2)?;

    let co2_danger = reading.indoor_co2 > settings.co2_danger;
    let mask = reading.indoor_pm > settings.pm25_danger && reading.outdoor_pm > settings.outdoor_severe;

    let guide = if co2_danger {
        Guide::VentilateNow
    } else if mask {
        Guide::WearMask
    } else if reading.indoor_pm > settings.pm25_warning
        || reading.outdoor_pm > settings.outdoor_warning
    {
        Guide::Ventilate
    } else if reading.indoor_co2 > settings.co2_warning {
        Guide::Co2Caution
    } else {
        Guide::Good
    };

    // Actions follow their own chain: outdoor-only warnings and CO₂ cautions
    // have no dedicated action.
    let actions = if co2_danger {
        vec![
            format!("CO₂ above {} ppm: ventilate immediately", settings.co2_danger),
            "Open the classroom door if a lesson is in progress".to_string(),
        ]
    } else if mask {
        vec![
            "Wear a KF94 or better mask".to_string(),
            "Avoid outdoor activities".to_string(),
        ]
    } else if reading.indoor_pm > settings.pm25_warning {
        vec![
            format!("PM2.5 above {} µg/m³", settings.pm25_warning),
            "Ventilate for 2-3 minutes every break".to_string(),
        ]
    } else {
        vec![
            "Keep current conditions".to_string(),
            "Continue regular ventilation".to_string(),
        ]
    };

    Ok(Alert {
        guide,
        severity: guide.severity(),
        actions,
    })
}
