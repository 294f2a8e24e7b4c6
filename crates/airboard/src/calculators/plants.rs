//! Classroom plant effects.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{check_range, round2};
use crate::error::{Error, Result};

/// Upper bound on the humidity improvement, percent.
const MAX_HUMIDITY_EFFECT: f64 = 10.0;

/// Plant species with known absorption figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlantSpecies {
    /// Spathiphyllum.
    PeaceLily,
    /// Dypsis lutescens.
    ArecaPalm,
    /// Monstera deliciosa.
    Monstera,
    /// Sansevieria.
    SnakePlant,
    /// Ficus elastica.
    RubberPlant,
}

impl PlantSpecies {
    /// Every species.
    pub const ALL: [Self; 5] = [
        Self::PeaceLily,
        Self::ArecaPalm,
        Self::Monstera,
        Self::SnakePlant,
        Self::RubberPlant,
    ];

    /// Daily CO₂ absorption of one plant, kg.
    #[must_use]
    pub fn base_co2(self) -> f64 {
        match self {
            Self::PeaceLily => 0.05,
            Self::ArecaPalm => 0.08,
            Self::Monstera => 0.06,
            Self::SnakePlant => 0.04,
            Self::RubberPlant => 0.07,
        }
    }

    /// Relative humidity improvement of one plant, percent.
    #[must_use]
    pub fn base_humidity(self) -> f64 {
        match self {
            Self::PeaceLily => 0.8,
            Self::ArecaPalm => 1.2,
            Self::Monstera => 0.9,
            Self::SnakePlant => 0.5,
            Self::RubberPlant => 1.0,
        }
    }

    /// Care notes.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::PeaceLily => "Beginner friendly, easy care",
            Self::ArecaPalm => "Best air purifier, regulates humidity",
            Self::Monstera => "Decorative, moderate care",
            Self::SnakePlant => "Releases oxygen at night, low care",
            Self::RubberPlant => "Removes dust, hardy",
        }
    }
}

impl fmt::Display for PlantSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PeaceLily => "Peace lily",
            Self::ArecaPalm => "Areca palm",
            Self::Monstera => "Monstera",
            Self::SnakePlant => "Snake plant",
            Self::RubberPlant => "Rubber plant",
        };
        f.write_str(name)
    }
}

/// Plant effect coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantSettings {
    /// Scale applied to CO₂ absorption.
    pub co2_multiplier: f64,
    /// Scale applied to the humidity effect.
    pub humidity_multiplier: f64,
    /// Plants per m² for an effective placement.
    pub effectiveness_threshold: f64,
}

impl Default for PlantSettings {
    fn default() -> Self {
        Self {
            co2_multiplier: 1.0,
            humidity_multiplier: 1.0,
            effectiveness_threshold: 0.1,
        }
    }
}

impl PlantSettings {
    /// Validate against the allowed ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if a coefficient is out of range.
    pub fn validate(&self) -> Result<()> {
        check_range("plants.co2_multiplier", self.co2_multiplier, 0.5, 2.0)?;
        check_range("plants.humidity_multiplier", self.humidity_multiplier, 0.5, 2.0)?;
        check_range(
            "plants.effectiveness_threshold",
            self.effectiveness_threshold,
            0.05,
            0.2,
        )
    }
}

/// How well the plants cover the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// At or above the effectiveness threshold.
    Effective,
    /// At or above half the threshold.
    Moderate,
    /// Below half the threshold.
    Insufficient,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Effective => "effective",
            Self::Moderate => "moderate",
            Self::Insufficient => "insufficient",
        };
        f.write_str(text)
    }
}

/// Estimated plant effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantEstimate {
    /// Species evaluated.
    pub species: PlantSpecies,
    /// Daily CO₂ absorption, kg.
    pub co2_kg_per_day: f64,
    /// Relative humidity improvement, percent, capped at 10.
    pub humidity_effect: f64,
    /// Plants per m², two decimals.
    pub plants_per_sqm: f64,
    /// Placement rating.
    pub placement: Placement,
}

/// Estimate the effect of `count` plants in a room of `room_sqm` m².
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the room size is not positive.
pub fn estimate(
    species: PlantSpecies,
    count: u32,
    room_sqm: f64,
    settings: &PlantSettings,
) -> Result<PlantEstimate> {
    if !(room_sqm.is_finite() && room_sqm > 0.0) {
        return Err(Error::invalid_input(format!(
            "room size must be greater than 0 m², got {room_sqm}"
        )));
    }

    let count_f = f64::from(count);
    let co2 = species.base_co2() * settings.co2_multiplier * count_f;
    let humidity = (species.base_humidity() * settings.humidity_multiplier * count_f)
        .min(MAX_HUMIDITY_EFFECT);
    let density = count_f / room_sqm;

    let placement = if density >= settings.effectiveness_threshold {
        Placement::Effective
    } else if density >= settings.effectiveness_threshold / 2.0 {
        Placement::Moderate
    } else {
        Placement::Insufficient
    };

    Ok(PlantEstimate {
        species,
        co2_kg_per_day: co2,
        humidity_effect: humidity,
        plants_per_sqm: round2(density),
        placement,
    })
}
