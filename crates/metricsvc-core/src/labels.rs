//! Label normalization.
//!
//! Caller labels and process-wide default labels are merged into a single
//! [`LabelSet`] whose names are sorted, so the same label-name set always maps
//! to the same positional value vector.

use std::collections::BTreeMap;

/// Label injected with the raw logical name when the synthetic name label is enabled.
pub const NAME_LABEL: &str = "labelName";

/// Which side wins when a caller label and a default label share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelPrecedence {
    /// Defaults are applied after caller labels and overwrite them.
    #[default]
    DefaultsWin,
    /// Caller labels overwrite defaults.
    CallerWins,
}

/// Process-wide label policy, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct DefaultLabels {
    labels: BTreeMap<String, String>,
    precedence: LabelPrecedence,
    name_label: bool,
}

impl DefaultLabels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }

    pub fn with_precedence(mut self, precedence: LabelPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Also inject `labelName=<logical name>` into every label set.
    pub fn with_name_label(mut self, enabled: bool) -> Self {
        self.name_label = enabled;
        self
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn precedence(&self) -> LabelPrecedence {
        self.precedence
    }

    /// Merge caller labels for metric `name` into a sorted [`LabelSet`].
    pub fn apply(&self, name: &str, caller: &[(&str, &str)]) -> LabelSet {
        let mut seed = BTreeMap::new();
        if self.name_label {
            seed.insert(NAME_LABEL.to_string(), name.to_string());
        }
        merge(seed, caller, &self.labels, self.precedence)
    }
}

/// Merge caller labels with defaults; defaults win on collision.
pub fn normalize(caller: &[(&str, &str)], defaults: &BTreeMap<String, String>) -> LabelSet {
    merge(BTreeMap::new(), caller, defaults, LabelPrecedence::DefaultsWin)
}

fn merge(
    mut merged: BTreeMap<String, String>,
    caller: &[(&str, &str)],
    defaults: &BTreeMap<String, String>,
    precedence: LabelPrecedence,
) -> LabelSet {
    let caller = caller.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string()));
    let defaults = defaults.iter().map(|(k, v)| (k.clone(), v.clone()));
    match precedence {
        LabelPrecedence::DefaultsWin => {
            merged.extend(caller);
            merged.extend(defaults);
        }
        LabelPrecedence::CallerWins => {
            merged.extend(defaults);
            merged.extend(caller);
        }
    }
    LabelSet {
        pairs: merged.into_iter().collect(),
    }
}

/// Ordered `(name, value)` pairs with unique names, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    pairs: Vec<(String, String)>,
}

impl LabelSet {
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn names(&self) -> Vec<&str> {
        self.pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn values(&self) -> Vec<&str> {
        self.pairs.iter().map(|(_, v)| v.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|i| self.pairs[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
