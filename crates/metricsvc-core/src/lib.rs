//! metricsvc core: name sanitization, label normalization, the per-kind
//! registration cache and the instrument facade built on top of them.
//!
//! No async runtime here; the scrape endpoint lives in `metricsvc-exporter`.
//!
//! Recording sits on the caller's hot path. A bad label shape or a name clash
//! is logged and yields an inert handle, so library code must not unwind
//! either: `unwrap`, `expect` and `panic!` are lint errors in this crate.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod backend;
pub mod cache;
pub mod error;
pub mod facade;
pub mod labels;
pub mod name;

pub use backend::{
    CounterHandle, GaugeHandle, Handle, HistogramHandle, MetricKind, Registry, SummaryHandle,
};
pub use error::{MetricError, Result};
pub use facade::Instruments;
pub use labels::{normalize, DefaultLabels, LabelPrecedence, LabelSet};
pub use name::sanitize;
