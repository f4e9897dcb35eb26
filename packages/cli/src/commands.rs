//! Actions shared by the subcommands and the interactive mode.

use std::path::Path;

use malaria_forecast_analytics::AnalyticsError;
use malaria_forecast_analytics::chart::{forecast_chart, history_chart};
use malaria_forecast_analytics::forecast::{ForecastSettings, run_forecast};
use malaria_forecast_analytics::summary::describe;
use malaria_forecast_analytics_models::{ForecastResult, LineChart, SeriesSummary};
use malaria_forecast_cli_utils::{MultiProgress, spinner};
use malaria_forecast_dataset::filter::{Selection, select};
use malaria_forecast_dataset::{Dataset, DatasetError, loader};

/// Loads a surveillance file behind a spinner.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn load_dataset(multi: &MultiProgress, path: &Path) -> Result<Dataset, DatasetError> {
    let bar = spinner(multi, &format!("Loading {}", path.display()));
    let result = loader::load_path(path);
    match &result {
        Ok(dataset) => bar.finish_with_message(format!(
            "Loaded {} rows from {}",
            dataset.len(),
            path.display()
        )),
        Err(_) => bar.finish_and_clear(),
    }
    result
}

/// "Update Analysis": summary statistics and a history chart.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptySeries`] if nothing matches `selection`.
pub fn analyze(
    dataset: &Dataset,
    selection: &Selection,
) -> Result<(SeriesSummary, LineChart), AnalyticsError> {
    let series = select(dataset, selection);
    let summary = describe(&series)?;
    Ok((summary, history_chart(&series)))
}

/// "Run Prediction": fits ARIMA behind a spinner and returns the forecast
/// with its chart.
///
/// # Errors
///
/// Returns [`AnalyticsError`] for invalid settings, an empty or irregular
/// series, too little data, or a failed fit.
pub fn predict(
    multi: &MultiProgress,
    dataset: &Dataset,
    selection: &Selection,
    settings: &ForecastSettings,
) -> Result<(ForecastResult, LineChart), AnalyticsError> {
    let series = select(dataset, selection);
    let bar = spinner(multi, &format!("Fitting ARIMA{}", settings.order));
    let result = run_forecast(&series, settings);
    bar.finish_and_clear();

    let forecast = result?;
    if !forecast.model.converged {
        log::warn!(
            "Optimizer hit its iteration cap after {} iterations; forecast may be unreliable",
            forecast.model.iterations
        );
    }
    let chart = forecast_chart(&series, &forecast);
    Ok((forecast, chart))
}

/// Prints a one-line header describing the selection.
pub fn print_selection(selection: &Selection) {
    println!(
        "{} / {} / {}",
        selection.region,
        selection.county,
        selection.metric.label()
    );
    println!();
}

/// Prints the forecast lines and a short model description.
pub fn print_forecast(forecast: &ForecastResult) {
    for line in forecast.lines() {
        println!("{line}");
    }
    let model = &forecast.model;
    println!();
    println!(
        "ARIMA{}  sigma2={:.4}  log-likelihood={:.4}  AIC={:.4}  BIC={:.4}",
        model.order, model.sigma2, model.log_likelihood, model.aic, model.bic
    );
}

/// Writes `chart` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_chart(path: &Path, chart: &LineChart) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(chart)?;
    std::fs::write(path, json)?;
    log::info!("Wrote chart to {}", path.display());
    Ok(())
}
