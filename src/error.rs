//! ==============================================================================
//! error.rs - dashboard error taxonomy
//! ==============================================================================
//!
//! purpose:
//!     the two failure kinds the dashboard core can report.
//!     everything else (config files, sockets, server) goes through anyhow.
//!
//! relationships:
//!     - returned by: store.rs (fetch_latest), chart.rs (build_temperature_slices)
//!     - handled by: state.rs (turns a fetch error into an error notice)
//!
//! ==============================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// network, http status, decode or empty-result failure while fetching
    #[error("failed to fetch sensor readings: {0}")]
    Fetch(String),

    /// the pie chart maximum must be a positive number
    #[error("temperature maximum must be positive (got {max})")]
    DivisionByZero { max: f64 },
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        DashboardError::Fetch(e.to_string())
    }
}
