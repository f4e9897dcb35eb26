#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the malaria forecast server.
//!
//! These types are serialized to JSON for the REST API. They wrap the
//! analytics result types so the API contract can evolve independently.

use chrono::NaiveDate;
use malaria_forecast_analytics_models::{ForecastResult, LineChart, SeriesSummary};
use malaria_forecast_surveillance_models::Metric;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// Query parameters for the upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    /// File extension of the uploaded bytes (`csv`, `xlsx`, ...). Defaults
    /// to `xlsx`.
    pub format: Option<String>,
}

/// First and last observation dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDateRange {
    /// Earliest date.
    pub start: NaiveDate,
    /// Latest date.
    pub end: NaiveDate,
}

/// Response to an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDataset {
    /// Content hash identifying the dataset in later requests.
    pub dataset_id: String,
    /// Number of observations.
    pub rows: usize,
    /// Distinct regions in order of first appearance.
    pub regions: Vec<String>,
    /// Date span, absent for an empty table.
    pub date_range: Option<ApiDateRange>,
    /// Whether identical content was already loaded.
    pub cached: bool,
}

/// Query parameters for the counties endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountiesParams {
    /// Region name; absent or `All Regions` lists every county.
    pub region: Option<String>,
}

/// Body of the analysis endpoint ("Update Analysis").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Region name; absent or `All Regions` for no region filter.
    #[serde(default)]
    pub region: Option<String>,
    /// County name.
    pub county: String,
    /// Metric to summarise.
    #[serde(default)]
    pub metric: Metric,
}

/// Response of the analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// Structured statistics.
    pub summary: SeriesSummary,
    /// The statistics as a text block.
    pub summary_text: String,
    /// Values over time.
    pub chart: LineChart,
}

/// Body of the prediction endpoint ("Run Prediction"). Omitted values take
/// the configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    /// Region name; absent or `All Regions` for no region filter.
    #[serde(default)]
    pub region: Option<String>,
    /// County name.
    pub county: String,
    /// Metric to forecast.
    #[serde(default)]
    pub metric: Metric,
    /// Autoregressive order.
    pub p: Option<usize>,
    /// Differencing order.
    pub d: Option<usize>,
    /// Moving-average order.
    pub q: Option<usize>,
    /// Weeks to forecast.
    pub weeks: Option<usize>,
}

/// Response of the prediction endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    /// Forecast points and fitted model.
    pub forecast: ForecastResult,
    /// One `Week N: ...` line per forecast point.
    pub lines: Vec<String>,
    /// History plus dashed prediction.
    pub chart: LineChart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_request_fills_defaults() {
        let req: PredictionRequest =
            serde_json::from_str(r#"{"county":"Kilifi","weeks":6}"#).unwrap();
        assert_eq!(req.county, "Kilifi");
        assert_eq!(req.metric, Metric::TotalCases);
        assert!(req.region.is_none());
        assert!(req.p.is_none());
        assert_eq!(req.weeks, Some(6));
    }

    #[test]
    fn analysis_request_parses_metric() {
        let req: AnalysisRequest = serde_json::from_str(
            r#"{"region":"Coast","county":"Kilifi","metric":"mosquito_density"}"#,
        )
        .unwrap();
        assert_eq!(req.metric, Metric::MosquitoDensity);
        assert_eq!(req.region.as_deref(), Some("Coast"));
    }

    #[test]
    fn unknown_metric_is_rejected() {
        assert!(
            serde_json::from_str::<AnalysisRequest>(r#"{"county":"Kilifi","metric":"rainfall"}"#)
                .is_err()
        );
    }

    #[test]
    fn dataset_serializes_camel_case() {
        let json = serde_json::to_value(ApiDataset {
            dataset_id: "abc".to_string(),
            rows: 3,
            regions: vec!["Coast".to_string()],
            date_range: None,
            cached: false,
        })
        .unwrap();
        assert_eq!(json["datasetId"], "abc");
        assert!(json["dateRange"].is_null());
    }
}
