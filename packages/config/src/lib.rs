#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration shared by the CLI and the HTTP server.
//!
//! Every field has a default, so an empty (or absent) file is a valid
//! configuration. A file is read from the `--config` flag or the
//! [`CONFIG_ENV_VAR`] environment variable; `BIND_ADDR` and `PORT` then
//! override the server section.
//!
//! ```toml
//! cadence = "warn"
//!
//! [forecast]
//! p = 2
//! weeks = 8
//!
//! [server]
//! port = 9000
//! ```

use std::path::{Path, PathBuf};

use malaria_forecast_analytics::forecast::{
    DEFAULT_HORIZON, DEFAULT_MAX_HORIZON, DEFAULT_MAX_ORDER, ForecastSettings,
};
use malaria_forecast_analytics::optimization::NelderMeadConfig;
use malaria_forecast_analytics_models::{ArimaOrder, CadencePolicy};
use malaria_forecast_dataset::cache::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "MALARIA_FORECAST_CONFIG";

/// Environment variable overriding [`ServerConfig::bind_addr`].
pub const BIND_ADDR_ENV_VAR: &str = "BIND_ADDR";

/// Environment variable overriding [`ServerConfig::port`].
pub const PORT_ENV_VAR: &str = "PORT";

/// Default upload limit (16 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`DashboardConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but are inconsistent.
    #[error("Invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Default forecast request values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastDefaults {
    /// Autoregressive order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// Moving-average order.
    pub q: usize,
    /// Forecast horizon in weeks.
    pub weeks: usize,
}

impl Default for ForecastDefaults {
    fn default() -> Self {
        let ArimaOrder { p, d, q } = ArimaOrder::default();
        Self {
            p,
            d,
            q,
            weeks: DEFAULT_HORIZON,
        }
    }
}

impl ForecastDefaults {
    /// The default orders as an [`ArimaOrder`].
    #[must_use]
    pub const fn order(&self) -> ArimaOrder {
        ArimaOrder::new(self.p, self.d, self.q)
    }
}

/// Upper bounds on user-supplied forecast parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Largest accepted `p`, `d`, or `q`.
    pub max_order: usize,
    /// Longest accepted horizon in weeks.
    pub max_weeks: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_order: DEFAULT_MAX_ORDER,
            max_weeks: DEFAULT_MAX_HORIZON,
        }
    }
}

/// Likelihood optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Relative spread of objective values at which the search may stop.
    pub tolerance: f64,
    /// Simplex size at which the search may stop.
    pub point_tolerance: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let defaults = NelderMeadConfig::default();
        Self {
            max_iterations: defaults.max_iter,
            tolerance: defaults.tolerance,
            point_tolerance: defaults.point_tolerance,
        }
    }
}

/// Dataset cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of parsed datasets kept in memory.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted upload body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// How forecasts treat irregular weekly spacing.
    pub cadence: CadencePolicy,
    /// Default forecast request values.
    pub forecast: ForecastDefaults,
    /// Parameter limits.
    pub limits: Limits,
    /// Optimizer settings.
    pub optimizer: OptimizerConfig,
    /// Dataset cache settings.
    pub cache: CacheConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl DashboardConfig {
    /// Loads configuration from `path`, falling back to the file named by
    /// [`CONFIG_ENV_VAR`], falling back to defaults. Server environment
    /// overrides are applied last.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if the file cannot be read.
    /// * [`ConfigError::Parse`] if it is not valid TOML or has unknown keys.
    /// * [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let mut config = match path.or(env_path.as_deref()) {
            Some(path) => Self::from_file(path)?,
            None => {
                log::debug!("No config file given, using defaults");
                Self::default()
            }
        };

        config.apply_server_overrides(
            std::env::var(BIND_ADDR_ENV_VAR).ok(),
            std::env::var(PORT_ENV_VAR).ok(),
        );

        Ok(config)
    }

    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] if it is not valid TOML or has unknown keys.
    /// * [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that defaults fall within limits and optimizer settings are
    /// usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { message })
        };

        if self.limits.max_weeks == 0 {
            return invalid("limits.max_weeks must be at least 1".to_string());
        }
        if self.forecast.weeks == 0 || self.forecast.weeks > self.limits.max_weeks {
            return invalid(format!(
                "forecast.weeks = {} must be between 1 and {}",
                self.forecast.weeks, self.limits.max_weeks
            ));
        }
        let order = self.forecast.order();
        if [order.p, order.d, order.q]
            .iter()
            .any(|&v| v > self.limits.max_order)
        {
            return invalid(format!(
                "forecast order {order} exceeds limits.max_order = {}",
                self.limits.max_order
            ));
        }
        if self.optimizer.max_iterations == 0 {
            return invalid("optimizer.max_iterations must be at least 1".to_string());
        }
        if !(self.optimizer.tolerance.is_finite() && self.optimizer.tolerance > 0.0) {
            return invalid(format!(
                "optimizer.tolerance = {} must be a positive number",
                self.optimizer.tolerance
            ));
        }
        if !(self.optimizer.point_tolerance.is_finite() && self.optimizer.point_tolerance > 0.0) {
            return invalid(format!(
                "optimizer.point_tolerance = {} must be a positive number",
                self.optimizer.point_tolerance
            ));
        }
        if self.cache.capacity == 0 {
            return invalid("cache.capacity must be at least 1".to_string());
        }
        if self.server.max_upload_bytes == 0 {
            return invalid("server.max_upload_bytes must be at least 1".to_string());
        }

        Ok(())
    }

    /// Replaces the server address and port with the given values when
    /// present. An unparseable port is logged and ignored.
    pub fn apply_server_overrides(&mut self, bind_addr: Option<String>, port: Option<String>) {
        if let Some(bind_addr) = bind_addr.filter(|s| !s.trim().is_empty()) {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = port {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(e) => log::warn!("Ignoring {PORT_ENV_VAR}={port:?}: {e}"),
            }
        }
    }

    /// Optimizer settings in the form the forecast engine takes.
    #[must_use]
    pub fn nelder_mead(&self) -> NelderMeadConfig {
        NelderMeadConfig {
            max_iter: self.optimizer.max_iterations,
            tolerance: self.optimizer.tolerance,
            point_tolerance: self.optimizer.point_tolerance,
            ..NelderMeadConfig::default()
        }
    }

    /// Forecast settings using the configured defaults. Callers override
    /// `order` and `horizon` with request values.
    #[must_use]
    pub fn forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            order: self.forecast.order(),
            horizon: self.forecast.weeks,
            max_order: self.limits.max_order,
            max_horizon: self.limits.max_weeks,
            cadence: self.cadence,
            optimizer: self.nelder_mead(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.forecast.order(), ArimaOrder::new(1, 1, 1));
        assert_eq!(config.forecast.weeks, 4);
        assert_eq!(config.limits.max_order, 5);
        assert_eq!(config.limits.max_weeks, 12);
        assert_eq!(config.cadence, CadencePolicy::Strict);
        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
            cadence = "warn"

            [forecast]
            p = 2
            weeks = 8

            [server]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.cadence, CadencePolicy::Warn);
        assert_eq!(config.forecast.order(), ArimaOrder::new(2, 1, 1));
        assert_eq!(config.forecast.weeks, 8);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            DashboardConfig::from_toml_str("[forecast]\nr = 3\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn defaults_outside_limits_are_invalid() {
        let err = DashboardConfig::from_toml_str("[forecast]\nweeks = 20\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err =
            DashboardConfig::from_toml_str("[limits]\nmax_order = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_order"));

        assert!(DashboardConfig::from_toml_str("[optimizer]\ntolerance = -1.0\n").is_err());
        assert!(
            DashboardConfig::from_toml_str("[optimizer]\npoint_tolerance = 0.0\n").is_err()
        );
        assert!(DashboardConfig::from_toml_str("[cache]\ncapacity = 0\n").is_err());
    }

    #[test]
    fn server_overrides_apply_when_present() {
        let mut config = DashboardConfig::default();
        config.apply_server_overrides(Some("0.0.0.0".to_string()), Some("3000".to_string()));
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.server.port, 3000);

        config.apply_server_overrides(None, Some("not-a-port".to_string()));
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn forecast_settings_follow_config() {
        let config = DashboardConfig::from_toml_str(
            "cadence = \"ignore\"\n[optimizer]\nmax_iterations = 50\npoint_tolerance = 1e-6\n",
        )
        .unwrap();
        let settings = config.forecast_settings();
        assert_eq!(settings.cadence, CadencePolicy::Ignore);
        assert_eq!(settings.optimizer.max_iter, 50);
        assert!((settings.optimizer.point_tolerance - 1e-6).abs() < f64::EPSILON);
        assert_eq!(settings.horizon, 4);
        assert_eq!(settings.max_horizon, 12);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DashboardConfig::from_file(Path::new("/nonexistent/malaria.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
