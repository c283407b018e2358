use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{Family, Metric, MetricKind};
use crate::error::{MetricError, Result};

/// Type-erased view of a registered family, enough to validate and render it.
pub trait Collect: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> MetricKind;
    fn label_names(&self) -> &[String];
    fn reserved_label(&self) -> Option<&'static str>;
    fn render(&self, out: &mut String);
}

/// Owns every registered family, one per metric name across all kinds.
#[derive(Default)]
pub struct Registry {
    families: DashMap<String, Arc<dyn Collect>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            families: DashMap::new(),
        }
    }

    /// Create a family and register it.
    pub fn build<M: Metric>(&self, name: &str, help: &str, label_names: &[&str]) -> Result<Arc<Family<M>>> {
        let family = Arc::new(Family::<M>::new(name, help, label_names));
        self.register(Arc::clone(&family) as Arc<dyn Collect>)?;
        Ok(family)
    }

    /// Register a family. Fails on invalid names or when the name is taken.
    pub fn register(&self, family: Arc<dyn Collect>) -> Result<()> {
        validate_metric_name(family.name())?;
        for label in family.label_names() {
            validate_label_name(label)?;
            if family.reserved_label() == Some(label.as_str()) {
                return Err(MetricError::InvalidLabelName(format!(
                    "{label} is reserved for {} metrics",
                    family.kind()
                )));
            }
        }

        match self.families.entry(family.name().to_string()) {
            Entry::Occupied(e) => Err(MetricError::AlreadyRegistered(format!(
                "{} (as {})",
                e.key(),
                e.get().kind()
            ))),
            Entry::Vacant(v) => {
                v.insert(family);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Render all families in Prometheus text exposition format, sorted by name.
    pub fn render(&self) -> String {
        let mut families: Vec<Arc<dyn Collect>> =
            self.families.iter().map(|r| Arc::clone(r.value())).collect();
        families.sort_by(|a, b| a.name().cmp(b.name()));

        let mut out = String::new();
        for family in families {
            family.render(&mut out);
        }
        out
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MetricError::InvalidMetricName(name.to_string()))
    }
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, without the reserved `__` prefix.
pub fn validate_label_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid && !name.starts_with("__") {
        Ok(())
    } else {
        Err(MetricError::InvalidLabelName(name.to_string()))
    }
}
