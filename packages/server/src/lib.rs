#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the malaria forecast dashboard.
//!
//! Each endpoint corresponds to one dashboard interaction: upload a file,
//! list regions, list counties for a region, "Update Analysis", and
//! "Run Prediction". Uploaded files are parsed once and kept in a
//! content-addressed [`DatasetCache`]; later requests refer to them by
//! the returned `datasetId`.

mod error;
mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use malaria_forecast_config::DashboardConfig;
use malaria_forecast_dataset::cache::DatasetCache;

pub use error::ServerError;

/// Shared application state.
pub struct AppState {
    /// Parsed uploads keyed by content hash.
    pub cache: DatasetCache,
    /// Forecast defaults, limits, and server settings.
    pub config: DashboardConfig,
}

impl AppState {
    /// Creates state with an empty cache sized from `config`.
    #[must_use]
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            cache: DatasetCache::new(config.cache.capacity),
            config,
        }
    }
}

/// Registers the `/api` routes and the upload size limit.
pub fn configure(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.app_data(web::PayloadConfig::new(max_upload_bytes))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/datasets", web::post().to(handlers::upload_dataset))
                .route("/datasets/{id}", web::delete().to(handlers::delete_dataset))
                .route("/datasets/{id}/regions", web::get().to(handlers::regions))
                .route("/datasets/{id}/counties", web::get().to(handlers::counties))
                .route("/datasets/{id}/analysis", web::post().to(handlers::analysis))
                .route(
                    "/datasets/{id}/prediction",
                    web::post().to(handlers::prediction),
                ),
        );
}

/// Starts the API server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: DashboardConfig) -> std::io::Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;
    let max_upload_bytes = config.server.max_upload_bytes;
    let state = web::Data::new(AppState::new(config));

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, max_upload_bytes))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
