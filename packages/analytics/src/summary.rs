//! Descriptive statistics for the "Update Analysis" interaction.

use malaria_forecast_analytics_models::SeriesSummary;
use malaria_forecast_dataset::filter::FilteredSeries;

use crate::AnalyticsError;

/// Computes count, mean, sample standard deviation, min, quartiles, and
/// max over a filtered series.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptySeries`] if the series has no points.
pub fn describe(series: &FilteredSeries) -> Result<SeriesSummary, AnalyticsError> {
    describe_values(series.metric().column(), &series.values())
}

/// Computes a [`SeriesSummary`] over raw values.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptySeries`] if `values` is empty.
#[allow(clippy::cast_precision_loss)]
pub fn describe_values(name: &str, values: &[f64]) -> Result<SeriesSummary, AnalyticsError> {
    if values.is_empty() {
        return Err(AnalyticsError::EmptySeries);
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Ok(SeriesSummary {
        name: name.to_string(),
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

/// Quantile of ascending-sorted, non-empty data using linear
/// interpolation between the closest ranks.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}
