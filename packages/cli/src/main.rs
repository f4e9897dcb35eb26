#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the malaria forecast dashboard.
//!
//! ```text
//! malaria_forecast regions  --file data.xlsx
//! malaria_forecast counties --file data.xlsx [--region Coast]
//! malaria_forecast analyze  --file data.xlsx --county Kilifi [--metric deaths] [--chart out.json]
//! malaria_forecast predict  --file data.xlsx --county Kilifi [-p 1 -d 1 -q 1] [--weeks 4]
//! malaria_forecast serve    [--bind 0.0.0.0] [--port 8080]
//! ```
//!
//! Running with no subcommand enters interactive mode.
//!
//! Uses `indicatif-log-bridge` (via
//! [`malaria_forecast_cli_utils::init_logger`]) so log lines and spinners
//! never fight for the terminal.

mod commands;
mod interactive;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use malaria_forecast_analytics::forecast::ForecastSettings;
use malaria_forecast_analytics_models::ArimaOrder;
use malaria_forecast_config::DashboardConfig;
use malaria_forecast_dataset::filter::Selection;
use malaria_forecast_surveillance_models::{Metric, RegionSelection};

#[derive(Parser)]
#[command(
    name = "malaria_forecast",
    about = "Summarise and forecast regional malaria surveillance data"
)]
struct Cli {
    /// TOML configuration file (defaults to $MALARIA_FORECAST_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List region options ("All Regions" first)
    Regions {
        /// Surveillance file (.csv, .xlsx, .xls, .ods)
        #[arg(long)]
        file: PathBuf,
    },
    /// List counties within a region
    Counties {
        /// Surveillance file (.csv, .xlsx, .xls, .ods)
        #[arg(long)]
        file: PathBuf,
        /// Region name (omit for all regions)
        #[arg(long)]
        region: Option<String>,
    },
    /// Print summary statistics for one series
    Analyze {
        #[command(flatten)]
        target: Target,
        /// Write the history chart as JSON
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Forecast one series with ARIMA
    Predict {
        #[command(flatten)]
        target: Target,
        /// Autoregressive order
        #[arg(short)]
        p: Option<usize>,
        /// Differencing order
        #[arg(short)]
        d: Option<usize>,
        /// Moving-average order
        #[arg(short)]
        q: Option<usize>,
        /// Weeks to forecast
        #[arg(long)]
        weeks: Option<usize>,
        /// Write the forecast chart as JSON
        #[arg(long)]
        chart: Option<PathBuf>,
    },
    /// Start the HTTP API server
    Serve {
        /// Address to bind (overrides config and $BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides config and $PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// File plus region/county/metric selection.
#[derive(Args)]
struct Target {
    /// Surveillance file (.csv, .xlsx, .xls, .ods)
    #[arg(long)]
    file: PathBuf,
    /// Region name (omit for all regions)
    #[arg(long)]
    region: Option<String>,
    /// County name
    #[arg(long)]
    county: String,
    /// Metric: total_cases, severe_cases, deaths, mosquito_density
    #[arg(long, default_value_t = Metric::TotalCases)]
    metric: Metric,
}

impl Target {
    fn selection(&self) -> Selection {
        Selection {
            region: RegionSelection::from_option(self.region.as_deref()),
            county: self.county.clone(),
            metric: self.metric,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = malaria_forecast_cli_utils::init_logger();
    let cli = Cli::parse();
    let mut config = DashboardConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(&multi, config);
    };

    match command {
        Commands::Regions { file } => {
            let dataset = commands::load_dataset(&multi, &file)?;
            for region in dataset.region_options() {
                println!("{region}");
            }
        }
        Commands::Counties { file, region } => {
            let dataset = commands::load_dataset(&multi, &file)?;
            let region = RegionSelection::from_option(region.as_deref());
            let counties = dataset.counties(&region);
            if counties.is_empty() {
                eprintln!("No counties found for {region}");
                std::process::exit(1);
            }
            for county in counties {
                println!("{county}");
            }
        }
        Commands::Analyze { target, chart } => {
            let dataset = commands::load_dataset(&multi, &target.file)?;
            let selection = target.selection();
            let (summary, history) = commands::analyze(&dataset, &selection)?;

            commands::print_selection(&selection);
            println!("{summary}");
            if let Some(path) = chart {
                commands::write_chart(&path, &history)?;
            }
        }
        Commands::Predict {
            target,
            p,
            d,
            q,
            weeks,
            chart,
        } => {
            let defaults = config.forecast_settings();
            let settings = ForecastSettings {
                order: ArimaOrder::new(
                    p.unwrap_or(defaults.order.p),
                    d.unwrap_or(defaults.order.d),
                    q.unwrap_or(defaults.order.q),
                ),
                horizon: weeks.unwrap_or(defaults.horizon),
                ..defaults
            };

            let dataset = commands::load_dataset(&multi, &target.file)?;
            let selection = target.selection();
            let (forecast, prediction) =
                commands::predict(&multi, &dataset, &selection, &settings)?;

            commands::print_selection(&selection);
            commands::print_forecast(&forecast);
            if let Some(path) = chart {
                commands::write_chart(&path, &prediction)?;
            }
        }
        Commands::Serve { bind, port } => {
            config.apply_server_overrides(bind, port.map(|p| p.to_string()));
            actix_web::rt::System::new()
                .block_on(malaria_forecast_server::run_server(config))?;
        }
    }

    Ok(())
}
