//! ==============================================================================
//! chart.rs - temperature pie chart geometry
//! ==============================================================================
//!
//! purpose:
//!     splits the temperature value into a "current" and a "remaining" slice
//!     against a fixed maximum, and builds the dataset the renderer draws
//!     (labels, colours, centre text). no charting library involved.
//!
//! relationships:
//!     - used by: display.rs (temperature card), render.rs (svg pie)
//!
//! ==============================================================================

use crate::display::format_number;
use crate::error::DashboardError;
use serde::Serialize;

/// maximum temperature shown on the pie, in celsius
pub const DEFAULT_TEMPERATURE_MAX: f64 = 80.0;

pub const CURRENT_COLOR: &str = "#F75A5A";
pub const REMAINING_COLOR: &str = "#FFF8F8";

/// shown above the pie until the card is hovered or focused
pub const CAPTION_HINT: &str = "Click or hover to see temperature";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PieSlices {
    pub current: f64,
    /// never negative
    pub remaining: f64,
    /// value / max in percent, one decimal. can exceed 100.
    pub percentage: f64,
}

pub fn build_temperature_slices(value: f64, max: f64) -> Result<PieSlices, DashboardError> {
    if !max.is_finite() || max <= 0.0 {
        return Err(DashboardError::DivisionByZero { max });
    }
    Ok(split(value, max))
}

/// slices against `DEFAULT_TEMPERATURE_MAX`, which is always valid
pub fn default_temperature_slices(value: f64) -> PieSlices {
    split(value, DEFAULT_TEMPERATURE_MAX)
}

// max must already be checked
fn split(value: f64, max: f64) -> PieSlices {
    let remaining = (max - value).max(0.0);
    let percentage = round_one_decimal(value / max * 100.0);

    PieSlices { current: value, remaining, percentage }
}

/// one decimal place, rounded the way `Number.prototype.toFixed(1)` does:
/// on the exact binary value, so 0.15 (stored as 0.1499..) gives 0.1.
/// exact ties such as 0.25 go away from zero.
fn round_one_decimal(v: f64) -> f64 {
    let scaled = v * 10.0;
    if !v.is_finite() || ((v * 4.0).fract() == 0.0 && scaled.fract().abs() == 0.5) {
        return scaled.round() / 10.0;
    }
    format!("{:.1}", v).parse().unwrap_or(scaled.round() / 10.0)
}

impl PieSlices {
    /// share of the disc covered by the current slice, 0..=1
    pub fn current_share(&self) -> f64 {
        let total = self.current + self.remaining;
        if total > 0.0 && self.current > 0.0 {
            (self.current / total).min(1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PieSegment {
    pub label: String,
    pub value: f64,
    pub color: &'static str,
}

/// everything needed to draw the temperature card
#[derive(Debug, Clone, Serialize)]
pub struct PieChart {
    pub slices: PieSlices,
    pub max: f64,
    pub segments: [PieSegment; 2],
    /// drawn in the middle of the pie, empty when the value is 0
    pub center_text: String,
    /// revealed in place of `CAPTION_HINT` on hover or focus
    pub caption: String,
}

impl PieChart {
    pub fn new(slices: PieSlices, max: f64) -> Self {
        let current = format_number(slices.current);
        let remaining = format_number(slices.remaining);

        let center_text = if slices.current != 0.0 && !slices.current.is_nan() {
            format!("{}°C", current)
        } else {
            String::new()
        };

        Self {
            segments: [
                PieSegment {
                    label: format!("Current: {}°C", current),
                    value: slices.current,
                    color: CURRENT_COLOR,
                },
                PieSegment {
                    label: format!("Remaining: {}°C", remaining),
                    value: slices.remaining,
                    color: REMAINING_COLOR,
                },
            ],
            center_text,
            caption: format!("Temperature: {}°C (Max: {}°C)", current, format_number(max)),
            slices,
            max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_full() {
        let s = build_temperature_slices(40.0, 80.0).unwrap();
        assert_eq!(s, PieSlices { current: 40.0, remaining: 40.0, percentage: 50.0 });
        assert_eq!(s.current_share(), 0.5);
    }

    #[test]
    fn over_max_is_not_clamped() {
        let s = build_temperature_slices(90.0, 80.0).unwrap();
        assert_eq!(s, PieSlices { current: 90.0, remaining: 0.0, percentage: 112.5 });
        assert_eq!(s.current_share(), 1.0);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        let s = build_temperature_slices(25.0, DEFAULT_TEMPERATURE_MAX).unwrap();
        assert_eq!(s.remaining, 55.0);
        assert_eq!(s.percentage, 31.3);

        let s = build_temperature_slices(1.0, 3.0).unwrap();
        assert_eq!(s.percentage, 33.3);
    }

    #[test]
    fn rounding_follows_stored_decimal_value() {
        // 0.15, 0.35 are stored just below the tie, 2.45 just above
        assert_eq!(round_one_decimal(0.15), 0.1);
        assert_eq!(round_one_decimal(0.35), 0.3);
        assert_eq!(round_one_decimal(2.45), 2.5);
        // exact ties go away from zero
        assert_eq!(round_one_decimal(0.25), 0.3);
        assert_eq!(round_one_decimal(-0.25), -0.3);
        assert_eq!(round_one_decimal(31.25), 31.3);
        assert_eq!(round_one_decimal(33.333), 33.3);
        assert!(round_one_decimal(f64::NAN).is_nan());
    }

    #[test]
    fn zero_max_is_division_by_zero() {
        assert_eq!(
            build_temperature_slices(10.0, 0.0),
            Err(DashboardError::DivisionByZero { max: 0.0 })
        );
        assert!(build_temperature_slices(10.0, -1.0).is_err());
        assert!(build_temperature_slices(10.0, f64::NAN).is_err());
    }

    #[test]
    fn default_max_matches_checked_builder() {
        assert_eq!(
            default_temperature_slices(33.0),
            build_temperature_slices(33.0, DEFAULT_TEMPERATURE_MAX).unwrap()
        );
    }

    #[test]
    fn negative_value_keeps_remaining_positive() {
        let s = build_temperature_slices(-10.0, 80.0).unwrap();
        assert_eq!(s.remaining, 90.0);
        assert_eq!(s.percentage, -12.5);
        assert_eq!(s.current_share(), 0.0);
    }

    #[test]
    fn chart_labels() {
        let slices = build_temperature_slices(25.0, 80.0).unwrap();
        let chart = PieChart::new(slices, 80.0);
        assert_eq!(chart.segments[0].label, "Current: 25°C");
        assert_eq!(chart.segments[1].label, "Remaining: 55°C");
        assert_eq!(chart.segments[0].color, CURRENT_COLOR);
        assert_eq!(chart.center_text, "25°C");
        assert_eq!(chart.caption, "Temperature: 25°C (Max: 80°C)");
    }

    #[test]
    fn zero_temperature_has_no_center_text() {
        let slices = build_temperature_slices(0.0, 80.0).unwrap();
        let chart = PieChart::new(slices, 80.0);
        assert!(chart.center_text.is_empty());
        assert_eq!(chart.segments[1].label, "Remaining: 80°C");
    }
}
