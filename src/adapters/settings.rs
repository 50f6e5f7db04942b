//! Runtime settings: scorer configuration files and server options.
//!
//! Sources, in order of precedence:
//! - command-line flags (`--port`, `--config`, `--threshold` where supported)
//! - `PULSEWATCH_*` environment variables
//! - built-in reference values

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{ConfigError, Metric, MetricRange, ScorerConfig};

/// Path to an optional JSON scorer configuration file.
pub const CONFIG_PATH_ENV: &str = "PULSEWATCH_SCORER_CONFIG";

/// Optional override for the anomaly threshold.
pub const THRESHOLD_ENV: &str = "PULSEWATCH_ANOMALY_THRESHOLD";

pub const HOST_ENV: &str = "PULSEWATCH_HOST";
pub const PORT_ENV: &str = "PULSEWATCH_PORT";

pub const DEFAULT_PORT: u16 = 8080;

/// On-disk scorer configuration.
///
/// A section that is present replaces the reference section wholesale;
/// absent sections keep the reference values.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScorerConfigFile {
    threshold: Option<f64>,
    ranges: Option<BTreeMap<String, MetricRange>>,
    weights: Option<BTreeMap<String, f64>>,
}

fn keyed_by_metric<V>(section: BTreeMap<String, V>) -> Result<BTreeMap<Metric, V>, ConfigError> {
    section
        .into_iter()
        .map(|(name, v)| Ok::<_, ConfigError>((name.parse::<Metric>()?, v)))
        .collect()
}

/// Parse a scorer configuration from JSON text.
///
/// # Errors
/// Returns [`ConfigError`] for malformed JSON, unknown metric names, or a
/// configuration that fails validation.
pub fn parse_scorer_config(json: &str) -> Result<ScorerConfig, ConfigError> {
    let file: ScorerConfigFile = serde_json::from_str(json)?;
    let reference = ScorerConfig::reference();

    let ranges = match file.ranges {
        Some(section) => keyed_by_metric(section)?,
        None => reference.ranges().clone(),
    };
    let weights = match file.weights {
        Some(section) => keyed_by_metric(section)?,
        None => reference.weights().clone(),
    };
    let threshold = file.threshold.unwrap_or(reference.threshold());

    ScorerConfig::new(ranges, weights, threshold)
}

/// Load a scorer configuration from an optional file and threshold override.
///
/// # Errors
/// Returns [`ConfigError`] if the file cannot be read or parsed, the override
/// is not a number, or validation fails.
pub fn load_scorer_config_from(
    path: Option<&Path>,
    threshold_override: Option<&str>,
) -> Result<ScorerConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!("Loaded scorer configuration from {}", path.display());
            parse_scorer_config(&text)?
        }
        None => ScorerConfig::reference(),
    };

    match threshold_override {
        Some(raw) => {
            let threshold = raw.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnv {
                var: THRESHOLD_ENV,
                value: raw.to_string(),
            })?;
            config.with_threshold(threshold)
        }
        None => Ok(config),
    }
}

/// Load the scorer configuration from `PULSEWATCH_*` environment variables.
///
/// # Errors
/// See [`load_scorer_config_from`].
pub fn load_scorer_config() -> Result<ScorerConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let threshold = std::env::var(THRESHOLD_ENV).ok();
    load_scorer_config_from(path.as_deref(), threshold.as_deref())
}

/// HTTP server options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
        }
    }
}

impl ServerSettings {
    /// Resolve settings from CLI args (`--port`/`-p`) and the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidEnv`] for an unparsable host or port.
    pub fn from_args_and_env(args: &[String]) -> Result<Self, ConfigError> {
        let cli_port = args
            .iter()
            .position(|a| a == "--port" || a == "-p")
            .and_then(|i| args.get(i + 1))
            .cloned();
        Self::resolve(
            cli_port.or_else(|| std::env::var(PORT_ENV).ok()).as_deref(),
            std::env::var(HOST_ENV).ok().as_deref(),
        )
    }

    fn resolve(port: Option<&str>, host: Option<&str>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(raw) = port {
            let port = raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                var: PORT_ENV,
                value: raw.to_string(),
            })?;
            settings.addr.set_port(port);
        }
        if let Some(raw) = host {
            let ip = raw.trim().parse::<IpAddr>().map_err(|_| ConfigError::InvalidEnv {
                var: HOST_ENV,
                value: raw.to_string(),
            })?;
            settings.addr.set_ip(ip);
        }

        Ok(settings)
    }
}
