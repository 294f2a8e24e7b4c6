//! Respiratory risk score.
//!
//! The score adds 0-3 points for PM2.5 exposure and 0-3 for poor
//! ventilation, subtracts up to 1.5 for mask use, and adjusts by -1 to +1
//! for outdoor exercise habits.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{check_measurement, check_range};
use crate::error::{Error, Result};

/// Daily ventilation habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Ventilation {
    /// Almost never.
    Rarely,
    /// Once a day.
    Once,
    /// Two or three times a day.
    TwoToThree,
    /// More than three times a day.
    Frequent,
}

impl Ventilation {
    fn points(self) -> f64 {
        match self {
            Self::Rarely => 3.0,
            Self::Once => 2.0,
            Self::TwoToThree => 1.0,
            Self::Frequent => 0.0,
        }
    }
}

/// Mask-wearing habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MaskUse {
    /// Almost never.
    Never,
    /// Sometimes.
    Sometimes,
    /// Often.
    Often,
    /// Always.
    Always,
}

impl MaskUse {
    fn points(self) -> f64 {
        match self {
            Self::Never => 0.0,
            Self::Sometimes => -0.5,
            Self::Often => -1.0,
            Self::Always => -1.5,
        }
    }
}

/// Outdoor exercise frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Exercise {
    /// Every day.
    Daily,
    /// Three or four times a week.
    ThreeToFour,
    /// Once or twice a week.
    OneToTwo,
    /// Almost never.
    Rarely,
}

impl Exercise {
    fn points(self) -> f64 {
        match self {
            Self::Daily => -1.0,
            Self::ThreeToFour => -0.5,
            Self::OneToTwo => 0.0,
            Self::Rarely => 1.0,
        }
    }
}

/// Exposure bands and level boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// PM2.5 below this adds nothing, µg/m³.
    pub pm_low: f64,
    /// PM2.5 below this adds one point, µg/m³.
    pub pm_medium: f64,
    /// PM2.5 below this adds two points; at or above, three. µg/m³.
    pub pm_high: f64,
    /// Highest score rated low.
    pub low_boundary: f64,
    /// Highest score rated moderate.
    pub medium_boundary: f64,
    /// Highest score rated high.
    pub high_boundary: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            pm_low: 15.0,
            pm_medium: 35.0,
            pm_high: 75.0,
            low_boundary: 1.5,
            medium_boundary: 3.0,
            high_boundary: 5.0,
        }
    }
}

impl RiskSettings {
    /// Validate ranges and ordering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if a value is out of range or the
    /// bands or boundaries are not ascending.
    pub fn validate(&self) -> Result<()> {
        check_range("risk.pm_low", self.pm_low, 5.0, 25.0)?;
        check_range("risk.pm_medium", self.pm_medium, 20.0, 50.0)?;
        check_range("risk.pm_high", self.pm_high, 50.0, 100.0)?;
        check_range("risk.low_boundary", self.low_boundary, 0.5, 3.0)?;
        check_range("risk.medium_boundary", self.medium_boundary, 2.0, 5.0)?;
        check_range("risk.high_boundary", self.high_boundary, 4.0, 7.0)?;

        if !(self.pm_low < self.pm_medium && self.pm_medium < self.pm_high) {
            return Err(Error::config_validation(format!(
                "risk PM2.5 bands must be ascending, got {} / {} / {}",
                self.pm_low, self.pm_medium, self.pm_high
            )));
        }
        if !(self.low_boundary < self.medium_boundary && self.medium_boundary < self.high_boundary)
        {
            return Err(Error::config_validation(format!(
                "risk boundaries must be ascending, got {} / {} / {}",
                self.low_boundary, self.medium_boundary, self.high_boundary
            )));
        }
        Ok(())
    }

    fn exposure_points(&self, pm: f64) -> f64 {
        if pm < self.pm_low {
            0.0
        } else if pm < self.pm_medium {
            1.0
        } else if pm < self.pm_high {
            2.0
        } else {
            3.0
        }
    }
}

/// A person's exposure and habits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Average PM2.5 exposure, µg/m³.
    pub pm_exposure: f64,
    /// Ventilation habit.
    pub ventilation: Ventilation,
    /// Mask habit.
    pub mask: MaskUse,
    /// Exercise habit.
    pub exercise: Exercise,
}

/// Risk rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Keep it up.
    Low,
    /// Some improvement advised.
    Moderate,
    /// Prevention needed.
    High,
    /// See a doctor.
    VeryHigh,
}

impl RiskLevel {
    /// One-line advice for this level.
    #[must_use]
    pub fn advice(self) -> &'static str {
        match self {
            Self::Low => "Keep up your current habits",
            Self::Moderate => "Ventilate more often and wear a mask more",
            Self::High => "Active prevention is needed",
            Self::VeryHigh => "Consulting a specialist is recommended",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very high",
        };
        f.write_str(text)
    }
}

/// Score, rating and suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Raw score.
    pub score: f64,
    /// Rating derived from the score.
    pub level: RiskLevel,
    /// Advice for the rating.
    pub advice: String,
    /// Improvement suggestions.
    pub suggestions: Vec<String>,
}

/// Score a profile.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the exposure is negative.
pub fn assess(profile: &RiskProfile, settings: &RiskSettings) -> Result<RiskAssessment> {
    check_measurement("PM2.5 exposure", profile.pm_exposure)?;

    let score = settings.exposure_points(profile.pm_exposure)
        + profile.ventilation.points()
        + profile.mask.points()
        + profile.exercise.points();

    let level = if score <= settings.low_boundary {
        RiskLevel::Low
    } else if score <= settings.medium_boundary {
        RiskLevel::Moderate
    } else if score <= settings.high_boundary {
        RiskLevel::High
    } else {
        RiskLevel::VeryHigh
    };

    let mut suggestions = Vec::new();
    if score > settings.medium_boundary {
        suggestions.extend([
            "Ventilate three or more times a day",
            "Wear a KF94 mask outdoors",
            "Use an indoor air purifier",
        ]);
    }
    if score > settings.low_boundary {
        suggestions.extend([
            "Exercise outdoors three or more times a week",
            "Avoid smoking and second-hand smoke",
        ]);
    }

    Ok(RiskAssessment {
        score,
        level,
        advice: level.advice().to_string(),
        suggestions: suggestions.into_iter().map(String::from).collect(),
    })
}
