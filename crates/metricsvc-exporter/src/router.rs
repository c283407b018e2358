//! Axum router wiring for the scrape endpoint.
//!
//! Exposes the configured metrics path (default `/metrics`) and `/healthz`.

use std::sync::Arc;

use axum::{routing::get, Router};

use metricsvc_core::error::{MetricError, Result};
use metricsvc_core::Registry;

use crate::ops;

pub const HEALTHZ_PATH: &str = "/healthz";

/// Reject paths axum would refuse (or panic on) at route registration.
pub fn validate_path(path: &str) -> Result<()> {
    let plain = path.len() > 1
        && path.starts_with('/')
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.'));
    if !plain || path == HEALTHZ_PATH {
        return Err(MetricError::Configuration(format!(
            "invalid metrics path {path:?}"
        )));
    }
    Ok(())
}

pub fn build_router(path: &str, registry: Arc<Registry>) -> Router {
    Router::new()
        .route(path, get(ops::metrics))
        .route(HEALTHZ_PATH, get(ops::healthz))
        .with_state(registry)
}
