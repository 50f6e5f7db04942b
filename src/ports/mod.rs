//! Ports layer: trait definitions at the application boundary.
//!
//! Following Hexagonal Architecture, adapters (HTTP, CLI) talk to the
//! scoring engine through these traits.

mod detector;

pub use detector::AnomalyDetector;
