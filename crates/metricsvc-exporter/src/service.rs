//! Metric service: the instrument facade plus its scrape endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use metricsvc_core::error::Result;
use metricsvc_core::{
    CounterHandle, GaugeHandle, HistogramHandle, Instruments, Registry, SummaryHandle,
};

use crate::config::ServiceConfig;
use crate::exporter::Exporter;

pub struct MetricService {
    instruments: Arc<Instruments>,
    exporter: Exporter,
}

impl MetricService {
    /// Validate `cfg`, build the facade and start serving it.
    /// Returns Result so a bad address or a taken port fails construction outright.
    pub async fn start(cfg: ServiceConfig) -> Result<Self> {
        cfg.validate()?;

        let registry = Arc::new(Registry::new());
        let instruments = Arc::new(Instruments::new(
            cfg.prefix.clone(),
            cfg.default_labels(),
            Arc::clone(&registry),
        ));
        let exporter = Exporter::start(&cfg.listen_address, cfg.port, &cfg.path, registry).await?;

        tracing::info!(
            prefix = %cfg.prefix,
            default_labels = cfg.default_labels.len(),
            "metric service started"
        );
        Ok(Self {
            instruments,
            exporter,
        })
    }

    /// Shared facade, for handing to other tasks.
    pub fn instruments(&self) -> Arc<Instruments> {
        Arc::clone(&self.instruments)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.exporter.local_addr()
    }

    pub fn render(&self) -> String {
        self.instruments.render()
    }

    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> CounterHandle {
        self.instruments.counter(name, labels)
    }

    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> GaugeHandle {
        self.instruments.gauge(name, labels)
    }

    pub fn summary(&self, name: &str, labels: &[(&str, &str)]) -> SummaryHandle {
        self.instruments.summary(name, labels)
    }

    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> HistogramHandle {
        self.instruments.histogram(name, labels)
    }

    pub fn increment(&self, name: &str, labels: &[(&str, &str)]) {
        self.instruments.increment(name, labels);
    }

    pub fn count_error<E>(&self, err: &E, labels: &[(&str, &str)])
    where
        E: std::error::Error + 'static,
    {
        self.instruments.count_error(err, labels);
    }

    pub fn count_error_named(&self, error_name: &str, labels: &[(&str, &str)]) {
        self.instruments.count_error_named(error_name, labels);
    }

    /// Release the listener. Handles already given out keep working; they
    /// are just no longer scraped.
    pub async fn stop(self) -> Result<()> {
        self.exporter.stop().await
    }
}
