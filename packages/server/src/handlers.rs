//! HTTP handler functions for the malaria forecast API.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use malaria_forecast_analytics::chart::{forecast_chart, history_chart};
use malaria_forecast_analytics::forecast::{ForecastSettings, run_forecast};
use malaria_forecast_analytics::summary::describe;
use malaria_forecast_analytics_models::ArimaOrder;
use malaria_forecast_dataset::Dataset;
use malaria_forecast_dataset::filter::{Selection, select};
use malaria_forecast_dataset::loader::FileFormat;
use malaria_forecast_server_models::{
    AnalysisRequest, AnalysisResponse, ApiDataset, ApiDateRange, ApiHealth, CountiesParams,
    PredictionRequest, PredictionResponse, UploadParams,
};
use malaria_forecast_surveillance_models::RegionSelection;

use crate::AppState;
use crate::error::ServerError;

/// Format assumed when an upload does not name one.
const DEFAULT_UPLOAD_FORMAT: &str = "xlsx";

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/datasets?format=csv`
///
/// Parses the raw request body and caches it under its content hash.
pub async fn upload_dataset(
    state: web::Data<AppState>,
    params: web::Query<UploadParams>,
    body: web::Bytes,
) -> Result<HttpResponse, ServerError> {
    let format = FileFormat::from_extension(
        params.format.as_deref().unwrap_or(DEFAULT_UPLOAD_FORMAT),
    )?;

    log::info!("Received {} byte upload ({format:?})", body.len());

    let loaded = web::block(move || state.cache.load(&body, format)).await??;
    let dataset = &loaded.dataset;

    Ok(HttpResponse::Ok().json(ApiDataset {
        dataset_id: loaded.id.clone(),
        rows: dataset.len(),
        regions: dataset.regions(),
        date_range: dataset
            .date_range()
            .map(|(start, end)| ApiDateRange { start, end }),
        cached: loaded.cached,
    }))
}

/// `DELETE /api/datasets/{id}`
///
/// Evicts a dataset from the cache.
pub async fn delete_dataset(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let id = id.into_inner();
    if !state.cache.remove(&id) {
        return Err(ServerError::DatasetNotFound { id });
    }
    log::info!("Evicted dataset {id}");
    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/datasets/{id}/regions`
///
/// Returns `All Regions` followed by each region.
pub async fn regions(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let dataset = lookup(&state, &id)?;
    Ok(HttpResponse::Ok().json(dataset.region_options()))
}

/// `GET /api/datasets/{id}/counties?region=Coast`
///
/// Returns the sorted counties within a region.
pub async fn counties(
    state: web::Data<AppState>,
    id: web::Path<String>,
    params: web::Query<CountiesParams>,
) -> Result<HttpResponse, ServerError> {
    let dataset = lookup(&state, &id)?;
    let region = RegionSelection::from_option(params.region.as_deref());
    Ok(HttpResponse::Ok().json(dataset.counties(&region)))
}

/// `POST /api/datasets/{id}/analysis`
///
/// Summary statistics and history chart for one series.
pub async fn analysis(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<AnalysisRequest>,
) -> Result<HttpResponse, ServerError> {
    let dataset = lookup(&state, &id)?;
    let AnalysisRequest {
        region,
        county,
        metric,
    } = body.into_inner();

    let series = select(
        &dataset,
        &Selection {
            region: RegionSelection::from_option(region.as_deref()),
            county,
            metric,
        },
    );
    let summary = describe(&series)?;

    Ok(HttpResponse::Ok().json(AnalysisResponse {
        summary_text: summary.to_string(),
        summary,
        chart: history_chart(&series),
    }))
}

/// `POST /api/datasets/{id}/prediction`
///
/// Fits ARIMA on the blocking pool and returns the forecast lines and
/// chart. Omitted orders and horizon take the configured defaults.
pub async fn prediction(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<PredictionRequest>,
) -> Result<HttpResponse, ServerError> {
    let dataset = lookup(&state, &id)?;
    let request = body.into_inner();
    let settings = prediction_settings(state.config.forecast_settings(), &request);
    let selection = Selection {
        region: RegionSelection::from_option(request.region.as_deref()),
        county: request.county,
        metric: request.metric,
    };

    let response = web::block(move || {
        let series = select(&dataset, &selection);
        run_forecast(&series, &settings).map(|forecast| PredictionResponse {
            lines: forecast.lines(),
            chart: forecast_chart(&series, &forecast),
            forecast,
        })
    })
    .await??;

    Ok(HttpResponse::Ok().json(response))
}

fn lookup(state: &AppState, id: &str) -> Result<Arc<Dataset>, ServerError> {
    state
        .cache
        .get(id)
        .ok_or_else(|| ServerError::DatasetNotFound { id: id.to_string() })
}

/// Overlays request values on the configured defaults.
fn prediction_settings(defaults: ForecastSettings, request: &PredictionRequest) -> ForecastSettings {
    ForecastSettings {
        order: ArimaOrder::new(
            request.p.unwrap_or(defaults.order.p),
            request.d.unwrap_or(defaults.order.d),
            request.q.unwrap_or(defaults.order.q),
        ),
        horizon: request.weeks.unwrap_or(defaults.horizon),
        ..defaults
    }
}
