//! Instrument facade.
//!
//! Composes name sanitization, label normalization and the registration cache
//! into `counter`/`gauge`/`summary`/`histogram` lookups that never fail: any
//! error on the way is logged and answered with an inert handle.

use std::sync::Arc;

use crate::backend::{
    Counter, CounterHandle, Gauge, GaugeHandle, Handle, Histogram, HistogramHandle, Registry,
    Summary, SummaryHandle,
};
use crate::cache::{Cached, MetricCache};
use crate::error::Result;
use crate::labels::DefaultLabels;
use crate::name::sanitize;

/// Counter incremented by [`Instruments::count_error`].
pub const EXCEPTION_COUNTER: &str = "exception";
/// Label carrying the error type identifier.
pub const EXCEPTION_LABEL: &str = "exception";

pub struct Instruments {
    prefix: String,
    defaults: DefaultLabels,
    cache: MetricCache,
}

impl Instruments {
    pub fn new(prefix: impl Into<String>, defaults: DefaultLabels, registry: Arc<Registry>) -> Self {
        Self {
            prefix: prefix.into(),
            defaults,
            cache: MetricCache::new(registry),
        }
    }

    pub fn cache(&self) -> &MetricCache {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.cache.registry()
    }

    /// Prometheus text exposition of everything registered so far.
    pub fn render(&self) -> String {
        self.cache.registry().render()
    }

    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> CounterHandle {
        self.obtain(name, labels)
    }

    pub fn gauge(&self, name: &str, labels: &[(&str, &str)]) -> GaugeHandle {
        self.obtain(name, labels)
    }

    pub fn summary(&self, name: &str, labels: &[(&str, &str)]) -> SummaryHandle {
        self.obtain(name, labels)
    }

    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> HistogramHandle {
        self.obtain(name, labels)
    }

    pub fn try_counter(&self, name: &str, labels: &[(&str, &str)]) -> Result<CounterHandle> {
        self.try_obtain::<Counter>(name, labels)
    }

    pub fn try_gauge(&self, name: &str, labels: &[(&str, &str)]) -> Result<GaugeHandle> {
        self.try_obtain::<Gauge>(name, labels)
    }

    pub fn try_summary(&self, name: &str, labels: &[(&str, &str)]) -> Result<SummaryHandle> {
        self.try_obtain::<Summary>(name, labels)
    }

    pub fn try_histogram(&self, name: &str, labels: &[(&str, &str)]) -> Result<HistogramHandle> {
        self.try_obtain::<Histogram>(name, labels)
    }

    /// Increment counter `name` by one.
    pub fn increment(&self, name: &str, labels: &[(&str, &str)]) {
        self.counter(name, labels).inc();
    }

    /// Count an error under the `exception` counter, labelled with its type name.
    ///
    /// The identifier is the last path segment of the concrete type, without
    /// generic arguments. `E` must be sized: a trait object carries no usable
    /// type name, so errors held as `dyn Error` go through
    /// [`Instruments::count_error_named`] instead.
    pub fn count_error<E>(&self, _err: &E, labels: &[(&str, &str)])
    where
        E: std::error::Error + 'static,
    {
        self.count_error_named(error_type_name::<E>(), labels);
    }

    /// Count an error under a caller-chosen identifier.
    /// An `exception` entry in `labels` is replaced.
    pub fn count_error_named(&self, error_name: &str, labels: &[(&str, &str)]) {
        let mut merged: Vec<(&str, &str)> = labels
            .iter()
            .filter(|(k, _)| *k != EXCEPTION_LABEL)
            .copied()
            .collect();
        merged.push((EXCEPTION_LABEL, error_name));
        self.increment(EXCEPTION_COUNTER, &merged);
    }

    /// Hot-path boundary: instrumentation errors stop here.
    fn obtain<M: Cached>(&self, name: &str, labels: &[(&str, &str)]) -> Handle<M> {
        self.try_obtain::<M>(name, labels).unwrap_or_else(|e| {
            tracing::warn!(metric = %name, kind = %M::KIND, class = e.class(), error = %e, "metric unavailable, recording dropped");
            Handle::inert()
        })
    }

    fn try_obtain<M: Cached>(&self, name: &str, labels: &[(&str, &str)]) -> Result<Handle<M>> {
        let set = self.defaults.apply(name, labels);
        let metric = sanitize(name, &self.prefix);
        let family = self.cache.get_or_create::<M>(
            &metric,
            || format!("{} {}", M::KIND.title(), name),
            &set.names(),
        )?;
        family.scope(&set)
    }
}

/// Deterministic short identifier for an error type, e.g. `TimeoutError`.
///
/// Trait objects reduce to their principal trait (`dyn Error + Send` gives `Error`).
pub fn error_type_name<E: ?Sized>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.strip_prefix("dyn ").unwrap_or(full);
    let base = base.split(" + ").next().unwrap_or(base);
    let base = base.split('<').next().unwrap_or(base);
    base.rsplit("::").next().unwrap_or(base)
}
