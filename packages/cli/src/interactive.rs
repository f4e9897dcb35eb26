//! Interactive mode.
//!
//! Walks through the dashboard widgets in order: file, region, county,
//! then a loop of "Update Analysis" / "Run Prediction" until the user
//! quits. Analysis failures are reported and the loop continues.

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Select};
use malaria_forecast_analytics::forecast::ForecastSettings;
use malaria_forecast_analytics_models::{ArimaOrder, LineChart};
use malaria_forecast_cli_utils::{MultiProgress, prompt_bounded};
use malaria_forecast_config::DashboardConfig;
use malaria_forecast_dataset::Dataset;
use malaria_forecast_dataset::filter::Selection;
use malaria_forecast_surveillance_models::{Metric, RegionSelection};

use crate::commands;

/// What to do next with the current selection.
enum Action {
    UpdateAnalysis,
    RunPrediction,
    ChangeSelection,
    StartServer,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::UpdateAnalysis,
        Self::RunPrediction,
        Self::ChangeSelection,
        Self::StartServer,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::UpdateAnalysis => "Update Analysis",
            Self::RunPrediction => "Run Prediction",
            Self::ChangeSelection => "Change region / county",
            Self::StartServer => "Start API server",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the interactive session.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read, the file cannot be
/// loaded, or the server fails to start.
pub fn run(
    multi: &MultiProgress,
    mut config: DashboardConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Malaria Surveillance Forecast");
    println!();

    let path: String = Input::new()
        .with_prompt("Surveillance file (.csv, .xlsx, .xls, .ods)")
        .interact_text()?;
    let dataset = commands::load_dataset(multi, Path::new(path.trim()))?;

    let Some((mut region, mut county)) = choose_location(&dataset)? else {
        return Ok(());
    };

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        println!();
        let idx = Select::new()
            .with_prompt(format!("{region} / {county}"))
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::UpdateAnalysis => {
                let selection = Selection {
                    region: region.clone(),
                    county: county.clone(),
                    metric: choose_metric()?,
                };
                match commands::analyze(&dataset, &selection) {
                    Ok((summary, chart)) => {
                        println!();
                        println!("{summary}");
                        offer_chart_save(&chart, "history")?;
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            Action::RunPrediction => {
                let selection = Selection {
                    region: region.clone(),
                    county: county.clone(),
                    metric: choose_metric()?,
                };
                let settings = choose_forecast_settings(&config)?;
                match commands::predict(multi, &dataset, &selection, &settings) {
                    Ok((forecast, chart)) => {
                        println!();
                        commands::print_forecast(&forecast);
                        offer_chart_save(&chart, "prediction")?;
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            Action::ChangeSelection => {
                if let Some((r, c)) = choose_location(&dataset)? {
                    region = r;
                    county = c;
                }
            }
            Action::StartServer => return start_server(&mut config),
            Action::Quit => return Ok(()),
        }
    }
}

/// Region then county. Returns `None` if the chosen region has no
/// counties.
fn choose_location(
    dataset: &Dataset,
) -> Result<Option<(RegionSelection, String)>, dialoguer::Error> {
    let regions = dataset.region_options();
    let idx = Select::new()
        .with_prompt("Select Region")
        .items(&regions)
        .default(0)
        .interact()?;
    let region = RegionSelection::from_option(Some(&regions[idx]));

    let counties = dataset.counties(&region);
    if counties.is_empty() {
        eprintln!("No counties found for {region}");
        return Ok(None);
    }
    let idx = Select::new()
        .with_prompt("Select County")
        .items(&counties)
        .default(0)
        .interact()?;

    Ok(Some((region, counties[idx].clone())))
}

fn choose_metric() -> Result<Metric, dialoguer::Error> {
    let labels: Vec<&str> = Metric::all().iter().map(|m| m.label()).collect();
    let idx = Select::new()
        .with_prompt("Metric")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(Metric::all()[idx])
}

fn choose_forecast_settings(
    config: &DashboardConfig,
) -> Result<ForecastSettings, dialoguer::Error> {
    let defaults = config.forecast_settings();
    let max_order = defaults.max_order;

    let p = prompt_bounded("AR order (p)", defaults.order.p, 0, max_order)?;
    let d = prompt_bounded("Differencing (d)", defaults.order.d, 0, max_order)?;
    let q = prompt_bounded("MA order (q)", defaults.order.q, 0, max_order)?;
    let weeks = prompt_bounded("Weeks to predict", defaults.horizon, 1, defaults.max_horizon)?;

    Ok(ForecastSettings {
        order: ArimaOrder::new(p, d, q),
        horizon: weeks,
        ..defaults
    })
}

fn offer_chart_save(chart: &LineChart, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Confirm::new()
        .with_prompt("Save chart as JSON?")
        .default(false)
        .interact()?
    {
        return Ok(());
    }

    let path: String = Input::new()
        .with_prompt("Output path")
        .default(format!("{name}.json"))
        .interact_text()?;
    commands::write_chart(&PathBuf::from(path.trim()), chart)
}

fn start_server(config: &mut DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(config.server.bind_addr.clone())
        .interact_text()?;

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default(config.server.port.to_string())
        .interact_text()?;

    config.apply_server_overrides(Some(bind_addr), Some(port_str));

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            config.server.bind_addr, config.server.port
        ))
        .default(true)
        .interact()?
    {
        println!("Cancelled.");
        return Ok(());
    }

    actix_web::rt::System::new().block_on(malaria_forecast_server::run_server(config.clone()))?;
    Ok(())
}
