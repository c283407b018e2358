//! Exporter lifecycle: owns the HTTP listener serving the registry.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{lookup_host, TcpListener};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use metricsvc_core::error::{MetricError, Result};
use metricsvc_core::Registry;

use crate::router;

/// A running scrape endpoint.
///
/// Dropping the exporter without calling [`Exporter::stop`] also shuts the
/// server down, but without waiting for it.
pub struct Exporter {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl Exporter {
    /// Resolve `host`, bind `port` on the first address that accepts it and
    /// serve `registry` under `path`.
    /// Resolve and bind failures are configuration errors: the caller asked for
    /// an address it cannot have.
    pub async fn start(host: &str, port: u16, path: &str, registry: Arc<Registry>) -> Result<Self> {
        router::validate_path(path)?;

        let addrs: Vec<SocketAddr> = lookup_host((host, port))
            .await
            .map_err(|e| MetricError::Configuration(format!("resolve {host:?} failed: {e}")))?
            .collect();
        if addrs.is_empty() {
            return Err(MetricError::Configuration(format!(
                "{host:?} resolved to no addresses"
            )));
        }

        let listener = TcpListener::bind(addrs.as_slice())
            .await
            .map_err(|e| MetricError::Configuration(format!("bind {host}:{port} failed: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| MetricError::Configuration(format!("local_addr failed: {e}")))?;

        let app = router::build_router(path, registry);
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
        });

        tracing::info!(%local_addr, path, "metrics exporter listening");
        Ok(Self {
            local_addr,
            shutdown: tx,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting scrapes and wait for the server task to finish.
    pub async fn stop(self) -> Result<()> {
        let Self {
            local_addr,
            shutdown,
            task,
        } = self;
        let _ = shutdown.send(());
        task.await
            .map_err(|e| MetricError::Internal(format!("exporter task failed: {e}")))?
            .map_err(|e| MetricError::Internal(format!("exporter server error: {e}")))?;

        tracing::info!(%local_addr, "metrics exporter stopped");
        Ok(())
    }
}
