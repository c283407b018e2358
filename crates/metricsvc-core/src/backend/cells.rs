use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{format_value, write_sample, Handle, Metric, MetricKind};

/// Default histogram buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// f64 stored as raw bits.
#[derive(Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    fn add(&self, delta: f64) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }
}

/// Monotonic counter.
#[derive(Default)]
pub struct Counter {
    value: AtomicF64,
}

impl Counter {
    pub fn inc(&self) {
        self.value.add(1.0);
    }

    /// Negative and NaN increments are dropped; counters never go down.
    pub fn inc_by(&self, v: f64) {
        if v.is_nan() || v < 0.0 {
            return;
        }
        self.value.add(v);
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }
}

impl Metric for Counter {
    const KIND: MetricKind = MetricKind::Counter;

    fn render(&self, name: &str, labels: &str, out: &mut String) {
        write_sample(out, name, labels, self.get());
    }
}

/// Value that can go up and down.
#[derive(Default)]
pub struct Gauge {
    value: AtomicF64,
}

impl Gauge {
    pub fn set(&self, v: f64) {
        self.value.set(v);
    }

    pub fn inc(&self) {
        self.value.add(1.0);
    }

    pub fn dec(&self) {
        self.value.add(-1.0);
    }

    pub fn add(&self, v: f64) {
        self.value.add(v);
    }

    pub fn sub(&self, v: f64) {
        self.value.add(-v);
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }
}

impl Metric for Gauge {
    const KIND: MetricKind = MetricKind::Gauge;

    fn render(&self, name: &str, labels: &str, out: &mut String) {
        write_sample(out, name, labels, self.get());
    }
}

/// Count and sum of observations. Quantiles are not tracked.
#[derive(Default)]
pub struct Summary {
    count: AtomicU64,
    sum: AtomicF64,
}

impl Summary {
    pub fn observe(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.add(v);
    }

    pub fn observe_duration(&self, d: Duration) {
        self.observe(d.as_secs_f64());
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> f64 {
        self.sum.get()
    }
}

impl Metric for Summary {
    const KIND: MetricKind = MetricKind::Summary;
    const RESERVED_LABEL: Option<&'static str> = Some("quantile");

    fn render(&self, name: &str, labels: &str, out: &mut String) {
        write_sample(out, &format!("{name}_sum"), labels, self.sum());
        write_sample(out, &format!("{name}_count"), labels, self.count() as f64);
    }
}

/// Fixed-bucket histogram over [`DEFAULT_BUCKETS`].
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicF64,
    // Cumulative: each bucket counts observations <= its bound.
    buckets: [AtomicU64; DEFAULT_BUCKETS.len()],
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicF64::default(),
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }
}

impl Histogram {
    pub fn observe(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.add(v);
        for (i, &bound) in DEFAULT_BUCKETS.iter().enumerate() {
            if v <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn observe_duration(&self, d: Duration) {
        self.observe(d.as_secs_f64());
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> f64 {
        self.sum.get()
    }

    /// Cumulative bucket counts, parallel to [`DEFAULT_BUCKETS`].
    pub fn bucket_counts(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|b| b.load(Ordering::Relaxed))
            .collect()
    }
}

impl Metric for Histogram {
    const KIND: MetricKind = MetricKind::Histogram;
    const RESERVED_LABEL: Option<&'static str> = Some("le");

    fn render(&self, name: &str, labels: &str, out: &mut String) {
        let prefix = if labels.is_empty() {
            String::new()
        } else {
            format!("{labels},")
        };
        let bucket = format!("{name}_bucket");
        for (&le, count) in DEFAULT_BUCKETS.iter().zip(self.bucket_counts()) {
            let with_le = format!("{prefix}le=\"{}\"", format_value(le));
            write_sample(out, &bucket, &with_le, count as f64);
        }
        let count = self.count();
        write_sample(out, &bucket, &format!("{prefix}le=\"+Inf\""), count as f64);
        write_sample(out, &format!("{name}_sum"), labels, self.sum());
        write_sample(out, &format!("{name}_count"), labels, count as f64);
    }
}

impl Handle<Counter> {
    pub fn inc(&self) {
        self.with(Counter::inc);
    }

    pub fn inc_by(&self, v: f64) {
        self.with(|c| c.inc_by(v));
    }

    /// Current value; `0` for an inert handle.
    pub fn get(&self) -> f64 {
        self.cell.as_ref().map(|c| c.get()).unwrap_or(0.0)
    }
}

impl Handle<Gauge> {
    pub fn set(&self, v: f64) {
        self.with(|g| g.set(v));
    }

    pub fn inc(&self) {
        self.with(Gauge::inc);
    }

    pub fn dec(&self) {
        self.with(Gauge::dec);
    }

    pub fn add(&self, v: f64) {
        self.with(|g| g.add(v));
    }

    pub fn sub(&self, v: f64) {
        self.with(|g| g.sub(v));
    }

    pub fn get(&self) -> f64 {
        self.cell.as_ref().map(|g| g.get()).unwrap_or(0.0)
    }
}

impl Handle<Summary> {
    pub fn observe(&self, v: f64) {
        self.with(|s| s.observe(v));
    }

    pub fn observe_duration(&self, d: Duration) {
        self.with(|s| s.observe_duration(d));
    }

    pub fn count(&self) -> u64 {
        self.cell.as_ref().map(|s| s.count()).unwrap_or(0)
    }

    pub fn sum(&self) -> f64 {
        self.cell.as_ref().map(|s| s.sum()).unwrap_or(0.0)
    }
}

impl Handle<Histogram> {
    pub fn observe(&self, v: f64) {
        self.with(|h| h.observe(v));
    }

    pub fn observe_duration(&self, d: Duration) {
        self.with(|h| h.observe_duration(d));
    }

    pub fn count(&self) -> u64 {
        self.cell.as_ref().map(|h| h.count()).unwrap_or(0)
    }

    pub fn sum(&self) -> f64 {
        self.cell.as_ref().map(|h| h.sum()).unwrap_or(0.0)
    }
}
