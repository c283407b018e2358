//! Name sanitization and label normalization.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::BTreeMap;

use metricsvc_core::labels::NAME_LABEL;
use metricsvc_core::{normalize, sanitize, DefaultLabels, LabelPrecedence};

const NAMES: [&str; 8] = [
    "hits",
    "Request Count!",
    "http.requests/total",
    "Ünïcode-Name",
    "",
    "__already__sane__",
    "MiXeD123",
    "a b\tc\nd",
];

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn sanitize_with_prefix() {
    assert_eq!(sanitize("Request Count!", "test"), "test_request_count_");
    assert_eq!(sanitize("hits", ""), "hits");
    assert_eq!(sanitize("hits", "My-App"), "my_app_hits");
}

#[test]
fn sanitize_is_idempotent_and_safe() {
    for n in NAMES {
        let once = sanitize(n, "");
        assert_eq!(sanitize(&once, ""), once, "name={n:?}");
        assert!(
            once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
            "name={n:?} sanitized={once:?}"
        );
        assert_eq!(once.chars().count(), n.chars().count(), "name={n:?}");
    }
}

#[test]
fn normalize_sorts_names_and_keeps_values_parallel() {
    let caller: Vec<(String, String)> = (0..10).map(|i| (format!("{i}"), format!("{i}"))).collect();
    let borrowed: Vec<(&str, &str)> = caller.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

    let set = normalize(&borrowed, &BTreeMap::new());
    let names = set.names();
    let values = set.values();

    assert_eq!(names.len(), 10);
    assert_eq!(values.len(), 10);
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    for (n, v) in names.iter().zip(values.iter()) {
        assert_eq!(n, v);
    }
}

#[test]
fn normalize_ignores_caller_order() {
    let a = normalize(&[("b", "2"), ("a", "1"), ("c", "3")], &BTreeMap::new());
    let b = normalize(&[("c", "3"), ("a", "1"), ("b", "2")], &BTreeMap::new());
    assert_eq!(a, b);
    assert_eq!(a.names(), vec!["a", "b", "c"]);
}

#[test]
fn defaults_override_caller_labels() {
    let set = normalize(&[("env", "dev"), ("region", "us")], &map(&[("env", "prod")]));
    assert_eq!(set.get("env"), Some("prod"));
    assert_eq!(set.get("region"), Some("us"));
    assert_eq!(set.len(), 2);
}

#[test]
fn caller_wins_when_configured() {
    let defaults = DefaultLabels::new(map(&[("env", "prod"), ("team", "core")]))
        .with_precedence(LabelPrecedence::CallerWins);
    let set = defaults.apply("hits", &[("env", "dev")]);
    assert_eq!(set.get("env"), Some("dev"));
    assert_eq!(set.get("team"), Some("core"));
}

#[test]
fn name_label_is_opt_in() {
    let plain = DefaultLabels::default().apply("Hits Total", &[]);
    assert!(plain.is_empty());

    let tagged = DefaultLabels::default().with_name_label(true).apply("Hits Total", &[]);
    assert_eq!(tagged.get(NAME_LABEL), Some("Hits Total"));

    // Caller labels may still override the synthetic label.
    let overridden = DefaultLabels::default()
        .with_name_label(true)
        .apply("Hits Total", &[(NAME_LABEL, "custom")]);
    assert_eq!(overridden.get(NAME_LABEL), Some("custom"));
}
