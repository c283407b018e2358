//! Per-kind registration cache.
//!
//! Each metric kind has its own map from sanitized metric name to the family
//! registered under it. The first registration for a name wins: later calls
//! get the cached family back even if they asked for different label names.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::backend::{Counter, Family, Gauge, Histogram, Metric, MetricKind, Registry, Summary};
use crate::error::Result;

/// Metric kinds that have a slot in [`MetricCache`].
pub trait Cached: Metric + Sized {
    fn slot(cache: &MetricCache) -> &DashMap<String, Arc<Family<Self>>>;
}

impl Cached for Counter {
    fn slot(cache: &MetricCache) -> &DashMap<String, Arc<Family<Self>>> {
        &cache.counters
    }
}

impl Cached for Gauge {
    fn slot(cache: &MetricCache) -> &DashMap<String, Arc<Family<Self>>> {
        &cache.gauges
    }
}

impl Cached for Summary {
    fn slot(cache: &MetricCache) -> &DashMap<String, Arc<Family<Self>>> {
        &cache.summaries
    }
}

impl Cached for Histogram {
    fn slot(cache: &MetricCache) -> &DashMap<String, Arc<Family<Self>>> {
        &cache.histograms
    }
}

pub struct MetricCache {
    registry: Arc<Registry>,
    counters: DashMap<String, Arc<Family<Counter>>>,
    gauges: DashMap<String, Arc<Family<Gauge>>>,
    summaries: DashMap<String, Arc<Family<Summary>>>,
    histograms: DashMap<String, Arc<Family<Histogram>>>,
}

impl MetricCache {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            counters: DashMap::new(),
            gauges: DashMap::new(),
            summaries: DashMap::new(),
            histograms: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Return the family cached under `name`, registering it on first use.
    ///
    /// The vacant branch runs under the shard write lock, so concurrent first
    /// callers register with the backend exactly once. A failed registration
    /// leaves the slot empty.
    pub fn get_or_create<M: Cached>(
        &self,
        name: &str,
        help: impl FnOnce() -> String,
        label_names: &[&str],
    ) -> Result<Arc<Family<M>>> {
        let slot = M::slot(self);
        if let Some(family) = slot.get(name) {
            return Ok(Arc::clone(family.value()));
        }

        match slot.entry(name.to_string()) {
            Entry::Occupied(e) => Ok(Arc::clone(e.get())),
            Entry::Vacant(v) => {
                let family = self.registry.build::<M>(name, &help(), label_names)?;
                tracing::debug!(metric = %name, kind = %M::KIND, labels = ?label_names, "metric registered");
                v.insert(Arc::clone(&family));
                Ok(family)
            }
        }
    }

    pub fn get<M: Cached>(&self, name: &str) -> Option<Arc<Family<M>>> {
        M::slot(self).get(name).map(|r| Arc::clone(r.value()))
    }

    /// Whether a family of `kind` is cached under `name`.
    pub fn contains(&self, kind: MetricKind, name: &str) -> bool {
        match kind {
            MetricKind::Counter => self.counters.contains_key(name),
            MetricKind::Gauge => self.gauges.contains_key(name),
            MetricKind::Summary => self.summaries.contains_key(name),
            MetricKind::Histogram => self.histograms.contains_key(name),
        }
    }

    /// Number of cached families of one kind.
    pub fn len(&self, kind: MetricKind) -> usize {
        match kind {
            MetricKind::Counter => self.counters.len(),
            MetricKind::Gauge => self.gauges.len(),
            MetricKind::Summary => self.summaries.len(),
            MetricKind::Histogram => self.histograms.len(),
        }
    }
}
