//! Top-level facade crate for metricsvc.
//!
//! Re-exports the instrumentation core and the exporter so users can depend on a single crate.

pub mod core {
    pub use metricsvc_core::*;
}

pub mod exporter {
    pub use metricsvc_exporter::*;
}
