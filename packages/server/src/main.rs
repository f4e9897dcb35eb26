#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the malaria forecast API server.
//!
//! Reads configuration from the file named by `MALARIA_FORECAST_CONFIG`
//! (if set), applies `BIND_ADDR` / `PORT`, and serves until stopped.

use malaria_forecast_config::DashboardConfig;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = DashboardConfig::load(None)?;
    malaria_forecast_server::run_server(config).await?;

    Ok(())
}
