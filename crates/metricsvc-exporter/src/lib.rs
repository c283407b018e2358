//! metricsvc exporter library entry.
//!
//! Wires the instrument facade from `metricsvc-core` to an HTTP scrape
//! endpoint and a strict YAML config. Consumed by the binary (`main.rs`) and
//! by integration tests.

pub mod config;
pub mod exporter;
pub mod ops;
pub mod router;
pub mod service;

pub use config::ServiceConfig;
pub use exporter::Exporter;
pub use service::MetricService;
