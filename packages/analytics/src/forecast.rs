//! The "Run Prediction" pipeline: validate, fit, extrapolate.

use chrono::Duration;
use malaria_forecast_analytics_models::{
    ArimaOrder, CadencePolicy, ForecastPoint, ForecastResult,
};
use malaria_forecast_dataset::filter::FilteredSeries;

use crate::AnalyticsError;
use crate::arima::Arima;
use crate::cadence::check_cadence;
use crate::optimization::NelderMeadConfig;

/// Largest accepted value for each of `p`, `d`, `q` by default.
pub const DEFAULT_MAX_ORDER: usize = 5;

/// Longest accepted forecast horizon by default, in weeks.
pub const DEFAULT_MAX_HORIZON: usize = 12;

/// Default forecast horizon, in weeks.
pub const DEFAULT_HORIZON: usize = 4;

/// Everything a prediction run needs besides the series itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    /// Model orders.
    pub order: ArimaOrder,
    /// Number of weeks to forecast.
    pub horizon: usize,
    /// Largest accepted `p`, `d`, or `q`.
    pub max_order: usize,
    /// Largest accepted horizon.
    pub max_horizon: usize,
    /// How to treat gaps that are not exactly one week.
    pub cadence: CadencePolicy,
    /// Likelihood optimizer settings.
    pub optimizer: NelderMeadConfig,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            order: ArimaOrder::default(),
            horizon: DEFAULT_HORIZON,
            max_order: DEFAULT_MAX_ORDER,
            max_horizon: DEFAULT_MAX_HORIZON,
            cadence: CadencePolicy::default(),
            optimizer: NelderMeadConfig::default(),
        }
    }
}

impl ForecastSettings {
    /// Checks the horizon and orders against the configured limits.
    ///
    /// # Errors
    ///
    /// * [`AnalyticsError::InvalidHorizon`] if the horizon is zero or above
    ///   `max_horizon`.
    /// * [`AnalyticsError::InvalidOrder`] for the first of `p`, `d`, `q`
    ///   above `max_order`.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.horizon == 0 || self.horizon > self.max_horizon {
            return Err(AnalyticsError::InvalidHorizon {
                value: self.horizon,
                max: self.max_horizon,
            });
        }

        let ArimaOrder { p, d, q } = self.order;
        for (name, value) in [("p", p), ("d", d), ("q", q)] {
            if value > self.max_order {
                return Err(AnalyticsError::InvalidOrder {
                    name,
                    value,
                    max: self.max_order,
                });
            }
        }

        Ok(())
    }
}

/// Fits an ARIMA model to `series` and forecasts `settings.horizon`
/// weeks past its last date.
///
/// # Errors
///
/// Checks run in this order, returning the first failure:
///
/// * [`AnalyticsError::InvalidHorizon`] / [`AnalyticsError::InvalidOrder`]
///   from [`ForecastSettings::validate`].
/// * [`AnalyticsError::EmptySeries`] if nothing matched the selection.
/// * [`AnalyticsError::IrregularCadence`] under
///   [`CadencePolicy::Strict`].
/// * [`AnalyticsError::InsufficientData`] or [`AnalyticsError::ModelFit`]
///   from [`Arima::fit`].
pub fn run_forecast(
    series: &FilteredSeries,
    settings: &ForecastSettings,
) -> Result<ForecastResult, AnalyticsError> {
    settings.validate()?;

    let Some(last_observed) = series.last_date() else {
        return Err(AnalyticsError::EmptySeries);
    };

    check_cadence(&series.dates(), settings.cadence)?;

    log::info!(
        "Fitting ARIMA{} to {} weekly value(s) of {}",
        settings.order,
        series.len(),
        series.metric()
    );

    let fitted = Arima::new(settings.order).fit(&series.values(), &settings.optimizer)?;
    let values = fitted.forecast(settings.horizon);

    let points = values
        .into_iter()
        .zip(1_i64..)
        .enumerate()
        .map(|(i, (value, weeks))| ForecastPoint {
            week: i + 1,
            date: last_observed + Duration::weeks(weeks),
            value,
        })
        .collect();

    Ok(ForecastResult {
        metric: series.metric(),
        last_observed,
        points,
        model: fitted.into_model(),
    })
}
