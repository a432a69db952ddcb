//! ==============================================================================
//! display.rs - reading -> renderer-ready cards
//! ==============================================================================
//!
//! purpose:
//!     turns one reading (or none yet) into the four dashboard cards:
//!     temperature (pie), humidity, soil moisture, gas.
//!
//! notes:
//!     the trend arrows are fixed per card. they are not computed from
//!     earlier readings, the core keeps no history.
//!
//! relationships:
//!     - uses: classify.rs (bands, badge tiers), chart.rs (temperature pie)
//!     - used by: state.rs, render.rs, main.rs (/api)
//!
//! ==============================================================================

use crate::chart::{build_temperature_slices, default_temperature_slices, PieChart, DEFAULT_TEMPERATURE_MAX};
use crate::classify::{classify, BadgeTier, Classification, SensorKind};
use crate::domain::Reading;
use crate::error::DashboardError;
use serde::Serialize;

pub const TEMPERATURE_TITLE: &str = "Temperature Readings";
pub const HUMIDITY_TITLE: &str = "Humidity Readings";
pub const MOISTURE_TITLE: &str = "Soil Moisture Readings";
pub const GAS_TITLE: &str = "Gas Sensor Readings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    None,
}

/// one dashboard card
#[derive(Debug, Clone, Serialize)]
pub struct DisplayModel {
    pub title: &'static str,
    /// value with its unit; temperature carries no unit (the renderer adds °C)
    pub formatted_value: String,
    pub trend: Trend,
    /// `None` for temperature, which has no bands
    pub classification: Option<Classification>,
    pub badge: Option<BadgeTier>,
    /// temperature card only
    pub pie: Option<PieChart>,
}

/// build the four cards with the default 80°C pie maximum. never fails.
pub fn to_display_model(reading: Option<&Reading>) -> [DisplayModel; 4] {
    let (t, h, m, g) = channels(reading);
    let slices = default_temperature_slices(t);
    assemble(PieChart::new(slices, DEFAULT_TEMPERATURE_MAX), h, m, g)
}

/// same as `to_display_model` with a configurable pie maximum
pub fn to_display_model_with_max(reading: Option<&Reading>, max: f64) -> Result<[DisplayModel; 4], DashboardError> {
    let (t, h, m, g) = channels(reading);
    let slices = build_temperature_slices(t, max)?;
    Ok(assemble(PieChart::new(slices, max), h, m, g))
}

fn channels(reading: Option<&Reading>) -> (f64, f64, f64, f64) {
    reading
        .map(|r| (r.temperature(), r.humidity(), r.soil_moisture(), r.gas()))
        .unwrap_or((0.0, 0.0, 0.0, 0.0))
}

fn assemble(pie: PieChart, humidity: f64, moisture: f64, gas: f64) -> [DisplayModel; 4] {
    [
        DisplayModel {
            title: TEMPERATURE_TITLE,
            formatted_value: format_number(pie.slices.current),
            trend: Trend::None,
            classification: None,
            badge: None,
            pie: Some(pie),
        },
        classified_card(HUMIDITY_TITLE, SensorKind::Humidity, humidity, format!("{}%", format_number(humidity)), Trend::Down),
        classified_card(MOISTURE_TITLE, SensorKind::SoilMoisture, moisture, format!("{}%", format_number(moisture)), Trend::Up),
        classified_card(GAS_TITLE, SensorKind::Gas, gas, format!("{} ppm", format_number(gas)), Trend::Up),
    ]
}

fn classified_card(title: &'static str, kind: SensorKind, value: f64, formatted_value: String, trend: Trend) -> DisplayModel {
    let classification = classify(kind, value);
    DisplayModel {
        title,
        formatted_value,
        trend,
        classification: Some(classification),
        badge: Some(classification.badge_tier()),
        pie: None,
    }
}

/// print a number the way the dashboard always has: `45`, `45.5`, `0.1`.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        // also folds -0 into 0
        "0".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn no_reading_yields_zero_cards() {
        let cards = to_display_model(None);
        assert_eq!(cards[0].title, TEMPERATURE_TITLE);
        assert_eq!(cards[0].formatted_value, "0");
        let pie = cards[0].pie.as_ref().unwrap();
        assert_eq!(pie.slices.current, 0.0);
        assert_eq!(pie.slices.remaining, 80.0);
        assert_eq!(pie.slices.percentage, 0.0);

        assert_eq!(cards[1].formatted_value, "0%");
        assert_eq!(cards[1].classification, Some(Classification::BoneDry));
        assert_eq!(cards[2].formatted_value, "0%");
        assert_eq!(cards[2].classification, Some(Classification::TooDry));
        assert_eq!(cards[3].formatted_value, "0 ppm");
        assert_eq!(cards[3].classification, Some(Classification::Excellent));
        assert_eq!(cards[3].badge, Some(BadgeTier::Success));
    }

    #[test]
    fn end_to_end_reading() {
        let reading = Reading::new(25.0, 45.0, 55.0, 150.0, Utc::now());
        let cards = to_display_model(Some(&reading));

        let pie = cards[0].pie.as_ref().unwrap();
        assert_eq!(pie.slices.current, 25.0);
        assert_eq!(pie.slices.remaining, 55.0);
        assert_eq!(pie.slices.percentage, 31.3);

        assert_eq!(cards[1].title, HUMIDITY_TITLE);
        assert_eq!(cards[1].formatted_value, "45%");
        assert_eq!(cards[1].classification, Some(Classification::OptimalHumidity));
        assert_eq!(cards[1].badge, Some(BadgeTier::Success));

        assert_eq!(cards[2].title, MOISTURE_TITLE);
        assert_eq!(cards[2].classification, Some(Classification::Optimal));
        assert_eq!(cards[2].badge, Some(BadgeTier::Success));

        assert_eq!(cards[3].title, GAS_TITLE);
        assert_eq!(cards[3].formatted_value, "150 ppm");
        assert_eq!(cards[3].classification, Some(Classification::Good));
        assert_eq!(cards[3].badge, Some(BadgeTier::Info));
    }

    #[test]
    fn trends_are_fixed_per_card() {
        let cards = to_display_model(None);
        let trends: Vec<_> = cards.iter().map(|c| c.trend).collect();
        assert_eq!(trends, vec![Trend::None, Trend::Down, Trend::Up, Trend::Up]);
    }

    #[test]
    fn nan_reading_does_not_fail() {
        let reading = Reading::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN, Utc::now());
        let cards = to_display_model(Some(&reading));
        assert_eq!(cards[1].classification, Some(Classification::Damp));
        assert_eq!(cards[3].classification, Some(Classification::Bad));
        assert_eq!(cards[3].formatted_value, "NaN ppm");
    }

    #[test]
    fn configurable_max() {
        let reading = Reading::new(50.0, 0.0, 0.0, 0.0, Utc::now());
        let cards = to_display_model_with_max(Some(&reading), 100.0).unwrap();
        assert_eq!(cards[0].pie.as_ref().unwrap().slices.percentage, 50.0);

        let err = to_display_model_with_max(Some(&reading), 0.0).unwrap_err();
        assert_eq!(err, DashboardError::DivisionByZero { max: 0.0 });
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(45.0), "45");
        assert_eq!(format_number(45.5), "45.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-3.25), "-3.25");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }
}
