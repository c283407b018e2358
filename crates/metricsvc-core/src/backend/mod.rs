//! Minimal in-process metric backend.
//!
//! A [`Family`] is registered once per metric name with a fixed, ordered list
//! of label names; every distinct label-value vector gets its own atomic cell.
//! The [`Registry`] owns the registered families and renders them in the
//! Prometheus text exposition format.

mod cells;
mod registry;

use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{MetricError, Result};
use crate::labels::LabelSet;

pub use cells::{Counter, Gauge, Histogram, Summary, DEFAULT_BUCKETS};
pub use registry::{validate_label_name, validate_metric_name, Collect, Registry};

pub type CounterHandle = Handle<Counter>;
pub type GaugeHandle = Handle<Gauge>;
pub type SummaryHandle = Handle<Summary>;
pub type HistogramHandle = Handle<Histogram>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Summary,
    Histogram,
}

impl MetricKind {
    /// Exposition `# TYPE` value.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Summary => "summary",
            MetricKind::Histogram => "histogram",
        }
    }

    /// Capitalized form used for generated help text.
    pub fn title(self) -> &'static str {
        match self {
            MetricKind::Counter => "Counter",
            MetricKind::Gauge => "Gauge",
            MetricKind::Summary => "Summary",
            MetricKind::Histogram => "Histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recordable value cell (a single label-value combination).
pub trait Metric: Default + Send + Sync + 'static {
    const KIND: MetricKind;

    /// Label name the exposition format reserves for this kind, if any.
    const RESERVED_LABEL: Option<&'static str> = None;

    /// Append this cell's samples. `labels` is the rendered `k="v"` list, possibly empty.
    fn render(&self, name: &str, labels: &str, out: &mut String);
}

/// A registered metric: name, help, fixed label names and the per-value cells.
pub struct Family<M: Metric> {
    name: String,
    help: String,
    label_names: Vec<String>,
    children: DashMap<Vec<String>, Arc<M>>,
}

impl<M: Metric> Family<M> {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
            children: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Return a handle bound to the values of `labels`.
    ///
    /// The label names must match the registered ones exactly, in order.
    pub fn scope(&self, labels: &LabelSet) -> Result<Handle<M>> {
        let same_shape = labels
            .pairs()
            .iter()
            .map(|(k, _)| k)
            .eq(self.label_names.iter());
        if !same_shape {
            return Err(MetricError::LabelShapeConflict {
                metric: self.name.clone(),
                registered: self.label_names.clone(),
                requested: labels.names().into_iter().map(String::from).collect(),
            });
        }

        let key: Vec<String> = labels.pairs().iter().map(|(_, v)| v.clone()).collect();
        if let Some(cell) = self.children.get(&key) {
            return Ok(Handle::live(Arc::clone(cell.value())));
        }
        let cell = self
            .children
            .entry(key)
            .or_insert_with(|| Arc::new(M::default()));
        Ok(Handle::live(Arc::clone(cell.value())))
    }

    /// Number of distinct label-value combinations recorded so far.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl<M: Metric> Collect for Family<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MetricKind {
        M::KIND
    }

    fn label_names(&self) -> &[String] {
        &self.label_names
    }

    fn reserved_label(&self) -> Option<&'static str> {
        M::RESERVED_LABEL
    }

    fn render(&self, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.name, escape_help(&self.help));
        let _ = writeln!(out, "# TYPE {} {}", self.name, M::KIND);

        let mut children: Vec<(Vec<String>, Arc<M>)> = self
            .children
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));

        for (values, cell) in children {
            let label_str = self
                .label_names
                .iter()
                .zip(values.iter())
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                .collect::<Vec<_>>()
                .join(",");
            cell.render(&self.name, &label_str, out);
        }
    }
}

/// Label-value scoped view into a [`Family`].
///
/// An inert handle is returned when the facade could not resolve the metric;
/// it accepts every recording call and drops it.
pub struct Handle<M> {
    cell: Option<Arc<M>>,
}

impl<M> Handle<M> {
    pub(crate) fn live(cell: Arc<M>) -> Self {
        Self { cell: Some(cell) }
    }

    pub fn inert() -> Self {
        Self { cell: None }
    }

    pub fn is_inert(&self) -> bool {
        self.cell.is_none()
    }

    /// Whether both handles record into the same cell.
    pub fn same_cell(&self, other: &Self) -> bool {
        match (&self.cell, &other.cell) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn with(&self, f: impl FnOnce(&M)) {
        if let Some(cell) = &self.cell {
            f(cell);
        }
    }
}

impl<M> Clone for Handle<M> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<M> fmt::Debug for Handle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("inert", &self.is_inert())
            .finish()
    }
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Write one sample line, e.g. `name{a="b"} 1`.
pub(crate) fn write_sample(out: &mut String, name: &str, labels: &str, value: f64) {
    if labels.is_empty() {
        let _ = writeln!(out, "{} {}", name, format_value(value));
    } else {
        let _ = writeln!(out, "{}{{{}}} {}", name, labels, format_value(value));
    }
}

pub(crate) fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}
