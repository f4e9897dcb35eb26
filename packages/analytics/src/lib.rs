#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Descriptive statistics, ARIMA forecasting, and chart building for
//! surveillance series.
//!
//! [`summary::describe`] backs the "Update Analysis" interaction and
//! [`forecast::run_forecast`] backs "Run Prediction". Both take a
//! [`malaria_forecast_dataset::filter::FilteredSeries`] and reject empty
//! input up front rather than producing `NaN`s.

pub mod arima;
pub mod cadence;
pub mod chart;
pub mod forecast;
pub mod optimization;
pub mod summary;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The filtered series has no observations.
    #[error("No observations match the selected region and county")]
    EmptySeries,

    /// An ARIMA order is outside the allowed range.
    #[error("Invalid ARIMA order {name}={value}: must be between 0 and {max}")]
    InvalidOrder {
        /// Which order (`p`, `d`, or `q`).
        name: &'static str,
        /// The value provided.
        value: usize,
        /// The largest accepted value.
        max: usize,
    },

    /// The forecast horizon is outside the allowed range.
    #[error("Invalid forecast horizon {value}: must be between 1 and {max} weeks")]
    InvalidHorizon {
        /// The value provided.
        value: usize,
        /// The largest accepted value.
        max: usize,
    },

    /// Too few observations to estimate the requested model.
    #[error("Insufficient data: ARIMA{order} needs at least {required} observations, got {actual}")]
    InsufficientData {
        /// Model orders, formatted as `(p, d, q)`.
        order: String,
        /// Minimum number of observations.
        required: usize,
        /// Number of observations available.
        actual: usize,
    },

    /// Consecutive observations are not exactly one week apart.
    #[error(
        "Irregular cadence at observation {index}: {previous} to {current} is {gap_days} day(s), expected 7"
    )]
    IrregularCadence {
        /// Zero-based index of the later observation.
        index: usize,
        /// Earlier date.
        previous: NaiveDate,
        /// Later date.
        current: NaiveDate,
        /// Days between them.
        gap_days: i64,
    },

    /// Likelihood optimization produced an unusable model.
    #[error("Model fit failed: {message}")]
    ModelFit {
        /// Description of what went wrong.
        message: String,
    },
}
