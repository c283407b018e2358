//! Shared error type across metricsvc crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricError>;

/// Unified error type used by the core and the exporter.
///
/// Only `Configuration` is ever surfaced to callers of the facade; every other
/// variant is absorbed at the facade boundary and turned into an inert handle.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("label shape conflict on {metric}: registered {registered:?}, requested {requested:?}")]
    LabelShapeConflict {
        metric: String,
        registered: Vec<String>,
        requested: Vec<String>,
    },
    #[error("metric already registered: {0}")]
    AlreadyRegistered(String),
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),
    #[error("invalid label name: {0:?}")]
    InvalidLabelName(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricError {
    /// Stable identifier used as a log field.
    pub fn class(&self) -> &'static str {
        match self {
            MetricError::Configuration(_) => "CONFIGURATION",
            MetricError::LabelShapeConflict { .. } => "LABEL_SHAPE_CONFLICT",
            MetricError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            MetricError::InvalidMetricName(_) => "INVALID_METRIC_NAME",
            MetricError::InvalidLabelName(_) => "INVALID_LABEL_NAME",
            MetricError::Internal(_) => "INTERNAL",
        }
    }
}
