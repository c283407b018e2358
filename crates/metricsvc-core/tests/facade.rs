//! Instrument facade: lookups, degradation to inert handles, error counting.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;
use std::error::Error;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use metricsvc_core::facade::{error_type_name, EXCEPTION_COUNTER};
use metricsvc_core::{DefaultLabels, Instruments, LabelPrecedence, MetricKind, Registry};

#[derive(Debug, thiserror::Error)]
#[error("timed out")]
struct TimeoutError;

#[derive(Debug, thiserror::Error)]
#[error("wrapped: {0:?}")]
struct Wrapped<T: std::fmt::Debug>(T);

fn instruments(prefix: &str, defaults: &[(&str, &str)]) -> Instruments {
    let defaults: BTreeMap<String, String> = defaults
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Instruments::new(prefix, DefaultLabels::new(defaults), Arc::new(Registry::new()))
}

#[test]
fn repeated_lookups_share_one_family() {
    let m = instruments("", &[]);
    let a = m.counter("hits", &[]);
    let b = m.counter("hits", &[]);
    assert!(a.same_cell(&b));

    a.inc();
    b.inc();
    assert_eq!(m.counter("hits", &[]).get(), 2.0);
    assert_eq!(m.registry().len(), 1);
}

#[test]
fn concurrent_increments_register_once() {
    let m = Arc::new(instruments("app", &[]));
    let threads: Vec<_> = (0..8)
        .map(|_| {
            let m = Arc::clone(&m);
            thread::spawn(move || {
                for _ in 0..100 {
                    m.increment("hits", &[("route", "/")]);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(m.registry().len(), 1);
    assert_eq!(m.cache().len(MetricKind::Counter), 1);
    assert!(m.cache().contains(MetricKind::Counter, EXCEPTION_COUNTER));
    assert!(!m.cache().contains(MetricKind::Gauge, EXCEPTION_COUNTER));
    assert_eq!(m.counter("hits", &[("route", "/")]).get(), 800.0);
    assert!(m.render().contains("app_hits{route=\"/\"} 800\n"));
}

#[test]
fn label_values_get_distinct_cells() {
    let m = instruments("", &[]);
    m.increment("requests", &[("code", "200")]);
    m.increment("requests", &[("code", "200")]);
    m.increment("requests", &[("code", "500")]);

    assert_eq!(m.counter("requests", &[("code", "200")]).get(), 2.0);
    assert_eq!(m.counter("requests", &[("code", "500")]).get(), 1.0);
}

#[test]
fn default_labels_are_merged_and_win() {
    let m = instruments("", &[("env", "prod")]);
    m.increment("requests", &[("env", "dev"), ("region", "us")]);

    let text = m.render();
    assert!(text.contains("requests{env=\"prod\",region=\"us\"} 1\n"), "{text}");
}

#[test]
fn caller_precedence_is_configurable() {
    let defaults = DefaultLabels::new(BTreeMap::from([("env".to_string(), "prod".to_string())]))
        .with_precedence(LabelPrecedence::CallerWins);
    let m = Instruments::new("", defaults, Arc::new(Registry::new()));
    m.increment("requests", &[("env", "dev")]);
    assert!(m.render().contains("requests{env=\"dev\"} 1\n"));
}

#[test]
fn label_shape_conflict_degrades_to_inert() {
    let m = instruments("", &[]);
    let first = m.counter("errors", &[("code", "500")]);
    assert!(!first.is_inert());

    let second = m.counter("errors", &[("code", "500"), ("type", "db")]);
    assert!(second.is_inert());
    second.inc();
    assert_eq!(second.get(), 0.0);

    let err = m
        .try_counter("errors", &[("code", "500"), ("type", "db")])
        .expect_err("shape mismatch");
    assert_eq!(err.class(), "LABEL_SHAPE_CONFLICT");

    // The original registration keeps working.
    first.inc();
    assert_eq!(m.counter("errors", &[("code", "500")]).get(), 1.0);
}

#[test]
fn cross_kind_collision_degrades_to_inert() {
    let m = instruments("", &[]);
    m.gauge("queue_depth", &[]).set(7.0);

    let counter = m.counter("queue depth", &[]);
    assert!(counter.is_inert());
    assert_eq!(
        m.try_counter("queue depth", &[]).expect_err("taken").class(),
        "ALREADY_REGISTERED"
    );
    assert_eq!(m.gauge("queue_depth", &[]).get(), 7.0);
}

#[test]
fn invalid_label_name_degrades_to_inert() {
    let m = instruments("", &[]);
    let h = m.histogram("latency", &[("bad-label", "x")]);
    assert!(h.is_inert());
    h.observe(1.0);
    assert!(m.registry().is_empty());
}

#[test]
fn prefix_and_help_text() {
    let m = instruments("test", &[]);
    m.summary("Request Count!", &[]).observe_duration(Duration::from_millis(250));

    let text = m.render();
    assert!(text.contains("# HELP test_request_count_ Summary Request Count!\n"), "{text}");
    assert!(text.contains("# TYPE test_request_count_ summary\n"));
    assert!(text.contains("test_request_count__sum 0.25\n"));
    assert!(text.contains("test_request_count__count 1\n"));
}

#[test]
fn gauges_and_histograms_record() {
    let m = instruments("", &[]);
    let g = m.gauge("inflight", &[]);
    g.inc();
    g.inc();
    g.dec();
    g.add(2.5);
    g.sub(0.5);
    assert_eq!(m.gauge("inflight", &[]).get(), 3.0);

    let h = m.histogram("latency", &[("op", "read")]);
    h.observe(0.2);
    h.observe_duration(Duration::from_secs(1));
    assert_eq!(h.count(), 2);
    assert!((h.sum() - 1.2).abs() < 1e-9);
}

#[test]
fn count_error_uses_type_name() {
    let m = instruments("", &[]);
    m.count_error(&TimeoutError, &[]);
    m.count_error(&TimeoutError, &[("exception", "ignored")]);

    assert_eq!(
        m.counter(EXCEPTION_COUNTER, &[("exception", "TimeoutError")]).get(),
        2.0
    );
    assert!(m.render().contains("exception{exception=\"TimeoutError\"} 2\n"));
}

#[test]
fn count_error_reuses_counter_cache() {
    let m = instruments("", &[]);
    m.count_error(&TimeoutError, &[]);
    assert_eq!(m.cache().len(MetricKind::Counter), 1);
    assert!(m.cache().get::<metricsvc_core::backend::Counter>("exception").is_some());
}

#[test]
fn error_type_name_is_short_and_stable() {
    assert_eq!(error_type_name::<TimeoutError>(), "TimeoutError");
    assert_eq!(error_type_name::<Wrapped<u8>>(), "Wrapped");
    assert_eq!(error_type_name::<std::io::Error>(), "Error");
    assert_eq!(
        error_type_name::<TimeoutError>(),
        error_type_name::<TimeoutError>()
    );
}

#[test]
fn boxed_errors_are_counted_by_concrete_type() {
    let m = instruments("", &[]);
    let timeout: Box<dyn Error + Send + Sync> = Box::new(TimeoutError);
    let disk: Box<dyn Error> = Box::new(io::Error::new(io::ErrorKind::Other, "disk full"));

    m.count_error(timeout.downcast_ref::<TimeoutError>().unwrap(), &[]);
    m.count_error(disk.downcast_ref::<io::Error>().unwrap(), &[]);
    m.count_error(&TimeoutError, &[]);

    assert_eq!(m.counter(EXCEPTION_COUNTER, &[("exception", "TimeoutError")]).get(), 2.0);
    assert_eq!(m.counter(EXCEPTION_COUNTER, &[("exception", "Error")]).get(), 1.0);
    let text = m.render();
    assert!(!text.contains("exception=\"Sync\""), "{text}");
}

#[test]
fn trait_objects_use_a_named_identifier() {
    let m = instruments("", &[]);
    let err: &dyn Error = &TimeoutError;
    let name = if err.is::<TimeoutError>() { "TimeoutError" } else { "Unknown" };

    m.count_error_named(name, &[("op", "fetch")]);
    m.count_error(&TimeoutError, &[("op", "fetch")]);

    let a = m.counter(EXCEPTION_COUNTER, &[("exception", "TimeoutError"), ("op", "fetch")]);
    assert_eq!(a.get(), 2.0);
    assert_eq!(m.registry().len(), 1);
}

#[test]
fn error_type_name_strips_trait_object_bounds() {
    assert_eq!(error_type_name::<dyn Error + Send + Sync>(), "Error");
    assert_eq!(error_type_name::<dyn Error>(), "Error");
    assert_eq!(error_type_name::<dyn Error + Send + Sync + 'static>(), "Error");
}

#[test]
fn instances_are_isolated() {
    let a = instruments("", &[]);
    let b = instruments("", &[]);
    a.increment("hits", &[]);
    assert_eq!(b.counter("hits", &[]).get(), 0.0);
    assert_eq!(a.counter("hits", &[]).get(), 1.0);
}
