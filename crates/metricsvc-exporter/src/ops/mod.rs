//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use metricsvc_core::Registry;

pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(registry): State<Arc<Registry>>) -> Response {
    let body = registry.render();

    (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response()
}
