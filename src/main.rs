//! Pulsewatch: vital-sign anomaly scoring service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pulsewatch::adapters::http;
use pulsewatch::adapters::sanitize::SanitizingMakeWriter;
use pulsewatch::adapters::settings::{self, ServerSettings};
use pulsewatch::{AnomalyScorer, ScoringService};

/// Initialize logging.
///
/// `PULSEWATCH_LOG_MODE=file` writes to `PULSEWATCH_LOG_FILE`
/// (default `pulsewatch.log`); anything else logs to stdout.
fn init_logging() -> Result<WorkerGuard> {
    let log_mode = std::env::var("PULSEWATCH_LOG_MODE").unwrap_or_else(|_| "stdout".to_string());

    let (writer, guard) = if log_mode == "file" {
        let log_file =
            std::env::var("PULSEWATCH_LOG_FILE").unwrap_or_else(|_| "pulsewatch.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: OpenOptions below reports the real failure.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                // Escape codes would split `user_id=` and defeat redaction.
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging()?;

    tracing::info!("Starting Pulsewatch...");

    let config = settings::load_scorer_config().context("Invalid scorer configuration")?;
    tracing::info!(
        metrics = config.weights().len(),
        threshold = config.threshold(),
        "Scorer configured"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let server = ServerSettings::from_args_and_env(&args)?;

    let service = ScoringService::new(Arc::new(AnomalyScorer::new(config)));
    let app = http::router(service);

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", server.addr))?;
    tracing::info!("Listening on http://{}", server.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Pulsewatch shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
