//! Line-chart descriptions for the history and prediction views.

use malaria_forecast_analytics_models::{ChartSeries, ForecastResult, LineChart, LineStyle};
use malaria_forecast_dataset::filter::FilteredSeries;
use malaria_forecast_surveillance_models::SeriesPoint;

/// X-axis label shared by every chart.
pub const DATE_AXIS_LABEL: &str = "Date";

/// Legend label of the observed line on a prediction chart.
pub const HISTORICAL_LABEL: &str = "Historical Data";

/// Legend label of the forecast line on a prediction chart.
pub const PREDICTED_LABEL: &str = "Predicted Data";

/// Values of the selected metric plotted against date.
#[must_use]
pub fn history_chart(series: &FilteredSeries) -> LineChart {
    let label = series.metric().label();
    LineChart {
        title: format!("{label} Over Time"),
        x_label: DATE_AXIS_LABEL.to_string(),
        y_label: label.to_string(),
        series: vec![ChartSeries {
            label: label.to_string(),
            style: LineStyle::Solid,
            points: series.points.clone(),
        }],
    }
}

/// Observed values followed by a dashed forecast line.
#[must_use]
pub fn forecast_chart(series: &FilteredSeries, forecast: &ForecastResult) -> LineChart {
    let label = forecast.metric.label();
    LineChart {
        title: format!("{label} Prediction for {} Weeks", forecast.horizon()),
        x_label: DATE_AXIS_LABEL.to_string(),
        y_label: label.to_string(),
        series: vec![
            ChartSeries {
                label: HISTORICAL_LABEL.to_string(),
                style: LineStyle::Solid,
                points: series.points.clone(),
            },
            ChartSeries {
                label: PREDICTED_LABEL.to_string(),
                style: LineStyle::Dashed,
                points: forecast
                    .points
                    .iter()
                    .map(|p| SeriesPoint {
                        date: p.date,
                        value: p.value,
                    })
                    .collect(),
            },
        ],
    }
}
