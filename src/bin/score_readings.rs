//! Offline scorer for vital-sign readings.
//!
//! Reads a JSON array of reading objects and prints the anomaly scores
//! using the same scorer as the HTTP service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin score_readings -- <readings.json|-> [--config <path>] [--threshold <t>] [--explain]
//! ```
//!
//! Without `--config`/`--threshold` the `PULSEWATCH_SCORER_CONFIG` and
//! `PULSEWATCH_ANOMALY_THRESHOLD` environment variables apply.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use pulsewatch::adapters::settings;
use pulsewatch::application::parse_readings;
use pulsewatch::{AnomalyScorer, Reading};

#[derive(Debug, Default)]
struct Args {
    input: Option<String>,
    config: Option<PathBuf>,
    threshold: Option<String>,
    explain: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--config" => {
                args.config = Some(raw.next().context("--config requires a path")?.into());
            }
            "--threshold" => {
                args.threshold = Some(raw.next().context("--threshold requires a value")?);
            }
            "--explain" => args.explain = true,
            "-h" | "--help" => {
                println!(
                    "Usage: score_readings <readings.json|-> [--config <path>] [--threshold <t>] [--explain]"
                );
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown option: {other}"),
            other => {
                if args.input.replace(other.to_string()).is_some() {
                    bail!("Only one input file may be given");
                }
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read readings from stdin")?;
            Ok(buf)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
        }
    }
}

/// Decode the input with the same rules the HTTP endpoint applies to `metrics`.
fn load_readings(text: &str) -> Result<Vec<Reading>> {
    let value: serde_json::Value = serde_json::from_str(text).context("Malformed JSON input")?;
    let items = value
        .as_array()
        .context("Expected a JSON array of reading objects")?;
    Ok(parse_readings(items)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var(settings::CONFIG_PATH_ENV).ok().map(PathBuf::from));
    let threshold = args
        .threshold
        .clone()
        .or_else(|| std::env::var(settings::THRESHOLD_ENV).ok());
    let config = settings::load_scorer_config_from(config_path.as_deref(), threshold.as_deref())?;
    let scorer = AnomalyScorer::new(config);

    let text = read_input(args.input.as_deref())?;
    let readings = load_readings(&text)?;

    let output = if args.explain {
        let explanations: Vec<_> = readings.iter().map(|r| scorer.explain(r)).collect();
        serde_json::to_string_pretty(&explanations)?
    } else {
        serde_json::to_string_pretty(&scorer.score_batch(&readings))?
    };
    println!("{output}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["readings.json", "--threshold", "4", "--explain"]).expect("Valid args");
        assert_eq!(parsed.input.as_deref(), Some("readings.json"));
        assert_eq!(parsed.threshold.as_deref(), Some("4"));
        assert!(parsed.explain);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_load_readings_tolerates_extra_fields() {
        let readings = load_readings(
            r#"[
                {"heart_rate": 80, "recorded_at": "2024-05-01T10:00:00Z"},
                {"heart_rate": 80, "temperature": null}
            ]"#,
        )
        .expect("Extra fields and nulls should not fail the batch");
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].get("heart_rate"), Some(80.0));
        assert_eq!(readings[0].get("recorded_at"), None);
        assert_eq!(readings[1].get("temperature"), None);

        let scores = AnomalyScorer::default().score_batch(&readings);
        assert_eq!(scores.is_anomaly, vec![false, false]);
    }

    #[test]
    fn test_load_readings_errors() {
        assert!(load_readings(r#"{"heart_rate": 80}"#).is_err());
        assert!(load_readings("[{").is_err());
        assert!(load_readings(r#"[{"heart_rate": "fast"}]"#).is_err());
    }
}
