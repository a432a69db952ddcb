//! ==============================================================================
//! classify.rs - reading classification bands
//! ==============================================================================
//!
//! purpose:
//!     maps one numeric sensor value to a qualitative band ("Optimal", "Poor")
//!     and each band to the badge colour tier the renderer uses.
//!
//! rules:
//!     thresholds are inclusive upper bounds checked in ascending order.
//!     the first bound >= value wins, anything left over (including NaN,
//!     which fails every comparison) lands in the last band.
//!     humidity's first test is a strict `<`.
//!
//! relationships:
//!     - used by: display.rs (one classification per classified card)
//!
//! ==============================================================================

use serde::Serialize;
use std::fmt;

/// which threshold table to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Gas,
    SoilMoisture,
    Humidity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    // gas
    Excellent,
    Good,
    Moderate,
    Poor,
    Bad,
    // soil moisture
    TooDry,
    Optimal,
    TooWet,
    Waterlogged,
    // humidity
    BoneDry,
    Arid,
    OptimalHumidity,
    Damp,
}

/// coarse severity grouping over classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    Success,
    Info,
    Warning,
    Error,
}

// gas (ppm)
const GAS_EXCELLENT_MAX: f64 = 100.0;
const GAS_GOOD_MAX: f64 = 300.0;
const GAS_MODERATE_MAX: f64 = 500.0;
const GAS_POOR_MAX: f64 = 700.0;

// soil moisture (%)
const MOISTURE_TOO_DRY_MAX: f64 = 30.0;
const MOISTURE_OPTIMAL_MAX: f64 = 60.0;
const MOISTURE_TOO_WET_MAX: f64 = 70.0;

// humidity (%)
const HUMIDITY_BONE_DRY_BELOW: f64 = 20.0;
const HUMIDITY_ARID_MAX: f64 = 40.0;
const HUMIDITY_OPTIMAL_MAX: f64 = 60.0;

pub fn classify(kind: SensorKind, value: f64) -> Classification {
    match kind {
        SensorKind::Gas => classify_gas(value),
        SensorKind::SoilMoisture => classify_moisture(value),
        SensorKind::Humidity => classify_humidity(value),
    }
}

pub fn classify_gas(value: f64) -> Classification {
    if value <= GAS_EXCELLENT_MAX {
        Classification::Excellent
    } else if value <= GAS_GOOD_MAX {
        Classification::Good
    } else if value <= GAS_MODERATE_MAX {
        Classification::Moderate
    } else if value <= GAS_POOR_MAX {
        Classification::Poor
    } else {
        Classification::Bad
    }
}

pub fn classify_moisture(value: f64) -> Classification {
    if value <= MOISTURE_TOO_DRY_MAX {
        Classification::TooDry
    } else if value <= MOISTURE_OPTIMAL_MAX {
        Classification::Optimal
    } else if value <= MOISTURE_TOO_WET_MAX {
        Classification::TooWet
    } else {
        Classification::Waterlogged
    }
}

pub fn classify_humidity(value: f64) -> Classification {
    if value < HUMIDITY_BONE_DRY_BELOW {
        Classification::BoneDry
    } else if value <= HUMIDITY_ARID_MAX {
        Classification::Arid
    } else if value <= HUMIDITY_OPTIMAL_MAX {
        Classification::OptimalHumidity
    } else {
        Classification::Damp
    }
}

impl Classification {
    /// every label the dashboard can show
    #[cfg(test)]
    pub const ALL: [Classification; 13] = [
        Classification::Excellent,
        Classification::Good,
        Classification::Moderate,
        Classification::Poor,
        Classification::Bad,
        Classification::TooDry,
        Classification::Optimal,
        Classification::TooWet,
        Classification::Waterlogged,
        Classification::BoneDry,
        Classification::Arid,
        Classification::OptimalHumidity,
        Classification::Damp,
    ];

    /// the label as displayed on the card badge
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Excellent => "Excellent",
            Classification::Good => "Good",
            Classification::Moderate => "Moderate",
            Classification::Poor => "Poor",
            Classification::Bad => "Bad",
            Classification::TooDry => "Too Dry",
            Classification::Optimal => "Optimal",
            Classification::TooWet => "Too Wet",
            Classification::Waterlogged => "Waterlogged",
            Classification::BoneDry => "Bone Dry",
            Classification::Arid => "Arid",
            Classification::OptimalHumidity => "Optimal Humidity",
            Classification::Damp => "Damp",
        }
    }

    pub fn badge_tier(&self) -> BadgeTier {
        match self {
            Classification::Excellent
            | Classification::Optimal
            | Classification::OptimalHumidity => BadgeTier::Success,
            Classification::Good => BadgeTier::Info,
            Classification::Moderate => BadgeTier::Warning,
            Classification::Poor
            | Classification::Bad
            | Classification::TooDry
            | Classification::TooWet
            | Classification::Waterlogged
            | Classification::BoneDry
            | Classification::Arid
            | Classification::Damp => BadgeTier::Error,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl BadgeTier {
    /// css class suffix, e.g. `badge-success`
    pub fn css_class(&self) -> &'static str {
        match self {
            BadgeTier::Success => "badge-success",
            BadgeTier::Info => "badge-info",
            BadgeTier::Warning => "badge-warning",
            BadgeTier::Error => "badge-error",
        }
    }
}
