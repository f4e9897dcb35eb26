#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Summary, forecast, and chart result types for surveillance analytics.
//!
//! These are the outputs of the "Update Analysis" and "Run Prediction"
//! interactions. They serialize to JSON for the HTTP API and render as
//! plain text for the CLI.

use chrono::NaiveDate;
use malaria_forecast_surveillance_models::{Metric, SeriesPoint};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Descriptive statistics over one filtered series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    /// Column the statistics were computed over.
    pub name: String,
    /// Number of observations.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (n - 1). `None` with fewer than two
    /// observations.
    pub std: Option<f64>,
    /// Minimum.
    pub min: f64,
    /// 25th percentile.
    pub q25: f64,
    /// Median.
    pub median: f64,
    /// 75th percentile.
    pub q75: f64,
    /// Maximum.
    pub max: f64,
}

impl std::fmt::Display for SeriesSummary {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows: [(&str, Option<f64>); 8] = [
            ("count", Some(self.count as f64)),
            ("mean", Some(self.mean)),
            ("std", self.std),
            ("min", Some(self.min)),
            ("25%", Some(self.q25)),
            ("50%", Some(self.median)),
            ("75%", Some(self.q75)),
            ("max", Some(self.max)),
        ];
        for (label, value) in rows {
            match value {
                Some(v) => writeln!(f, "{label:<6}{v:>16.6}")?,
                None => writeln!(f, "{label:<6}{:>16}", "NaN")?,
            }
        }
        write!(f, "Name: {}, dtype: float64", self.name)
    }
}

/// ARIMA model orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
}

impl ArimaOrder {
    /// Creates an order triple.
    #[must_use]
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

/// How the forecast engine treats series that are not strictly weekly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CadencePolicy {
    /// Reject any gap other than exactly seven days.
    #[default]
    Strict,
    /// Log irregular gaps and forecast anyway.
    Warn,
    /// Assume weekly spacing without checking.
    Ignore,
}

/// Parameters and fit statistics of an estimated ARIMA model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFit {
    /// Model orders.
    pub order: ArimaOrder,
    /// Mean of the differenced series. Only estimated when `d == 0`.
    pub constant: Option<f64>,
    /// Autoregressive coefficients, lag 1 first.
    pub ar: Vec<f64>,
    /// Moving-average coefficients, lag 1 first.
    pub ma: Vec<f64>,
    /// Innovation variance.
    pub sigma2: f64,
    /// Exact Gaussian log-likelihood at the optimum.
    pub log_likelihood: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Bayesian information criterion.
    pub bic: f64,
    /// Observations that entered the likelihood.
    pub n_obs: usize,
    /// Optimizer iterations used.
    pub iterations: usize,
    /// Whether the optimizer met its tolerance before the iteration cap.
    pub converged: bool,
}

/// One forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    /// Step number, starting at 1.
    pub week: usize,
    /// Forecast date (`last observed + 7 * week` days).
    pub date: NaiveDate,
    /// Point forecast.
    pub value: f64,
}

/// Output of a prediction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    /// Forecast metric.
    pub metric: Metric,
    /// Last historical date the forecast extends from.
    pub last_observed: NaiveDate,
    /// Point forecasts, exactly `horizon` of them.
    pub points: Vec<ForecastPoint>,
    /// The fitted model.
    pub model: ModelFit,
}

impl ForecastResult {
    /// Number of forecast steps.
    #[must_use]
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    /// Text lines of the form `Week 1: 123.45 predicted total cases`.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let noun = self.metric.label().to_lowercase();
        self.points
            .iter()
            .map(|p| format!("Week {}: {:.2} predicted {noun}", p.week, p.value))
            .collect()
    }
}

/// Line stroke style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    /// Continuous line.
    Solid,
    /// Dashed line.
    Dashed,
}

/// One line on a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// Legend label.
    pub label: String,
    /// Stroke style.
    pub style: LineStyle,
    /// Points in date order.
    pub points: Vec<SeriesPoint>,
}

/// A date-on-x line chart, ready for any plotting front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChart {
    /// Chart title.
    pub title: String,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Lines, drawn in order.
    pub series: Vec<ChartSeries>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(std: Option<f64>) -> SeriesSummary {
        SeriesSummary {
            name: "total_cases".to_string(),
            count: 4,
            mean: 2.5,
            std,
            min: 1.0,
            q25: 1.75,
            median: 2.5,
            q75: 3.25,
            max: 4.0,
        }
    }

    #[test]
    fn summary_renders_describe_block() {
        let text = summary(Some(1.290_994)).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "count         4.000000");
        assert_eq!(lines[2], "std           1.290994");
        assert_eq!(lines[4], "25%           1.750000");
        assert_eq!(lines[8], "Name: total_cases, dtype: float64");
    }

    #[test]
    fn summary_renders_missing_std_as_nan() {
        let text = summary(None).to_string();
        assert!(text.lines().any(|l| l == "std                NaN"));
    }

    #[test]
    fn forecast_lines_name_the_metric() {
        let date: NaiveDate = "2024-02-04".parse().unwrap();
        let result = ForecastResult {
            metric: Metric::SevereCases,
            last_observed: date,
            points: vec![ForecastPoint {
                week: 1,
                date,
                value: 12.346,
            }],
            model: ModelFit {
                order: ArimaOrder::default(),
                constant: None,
                ar: vec![0.5],
                ma: vec![0.1],
                sigma2: 1.0,
                log_likelihood: -10.0,
                aic: 26.0,
                bic: 27.0,
                n_obs: 10,
                iterations: 40,
                converged: true,
            },
        };
        assert_eq!(result.horizon(), 1);
        assert_eq!(result.lines(), ["Week 1: 12.35 predicted severe cases"]);
    }

    #[test]
    fn cadence_policy_parses_case_insensitively() {
        assert_eq!("STRICT".parse::<CadencePolicy>().unwrap(), CadencePolicy::Strict);
        assert_eq!("warn".parse::<CadencePolicy>().unwrap(), CadencePolicy::Warn);
        assert_eq!(CadencePolicy::Ignore.to_string(), "ignore");
        assert!("sometimes".parse::<CadencePolicy>().is_err());
    }

    #[test]
    fn order_displays_as_triple() {
        assert_eq!(ArimaOrder::default().to_string(), "(1, 1, 1)");
    }
}
