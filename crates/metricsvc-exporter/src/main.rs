//! metricsvc exporter
//!
//! Loads a service config (first argument, default `metricsvc.yaml`), starts
//! the scrape endpoint and publishes an `up` gauge and an uptime counter until
//! ctrl-c.

use std::time::{Duration, Instant};

use tracing_subscriber::{fmt, EnvFilter};

use metricsvc_exporter::{config, MetricService};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "metricsvc.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");

    let svc = MetricService::start(cfg)
        .await
        .expect("metric service failed to start");
    tracing::info!(addr = %svc.local_addr(), "metricsvc running");

    svc.gauge("up", &[]).set(1.0);
    let uptime = svc.counter("uptime seconds", &[]);
    let started = Instant::now();
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let mut last = started;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let now = Instant::now();
                uptime.inc_by(now.duration_since(last).as_secs_f64());
                last = now;
            }
            _ = &mut shutdown => break,
        }
    }

    tracing::info!(uptime_secs = started.elapsed().as_secs(), "shutting down");
    svc.stop().await.expect("metric service failed to stop");
}
