//! Adapters layer: integrations with the outside world.
//!
//! - `http`: axum router exposing the scoring endpoint
//! - `settings`: scorer config files and `PULSEWATCH_*` environment
//! - `sanitize`: redaction of user identifiers and secrets in logs

pub mod http;
pub mod sanitize;
pub mod settings;
