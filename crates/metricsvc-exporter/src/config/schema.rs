use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Deserialize;

use metricsvc_core::backend::validate_label_name;
use metricsvc_core::error::{MetricError, Result};
use metricsvc_core::{DefaultLabels, LabelPrecedence};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    /// Prepended (with `_`) to every metric name.
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// `0` binds an ephemeral port.
    pub port: u16,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default)]
    pub default_labels: BTreeMap<String, String>,

    #[serde(default)]
    pub label_precedence: LabelPrecedenceConfig,

    /// Inject `labelName=<logical name>` into every label set.
    #[serde(default)]
    pub name_label: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPrecedenceConfig {
    #[default]
    DefaultsWin,
    CallerWins,
}

impl From<LabelPrecedenceConfig> for LabelPrecedence {
    fn from(p: LabelPrecedenceConfig) -> Self {
        match p {
            LabelPrecedenceConfig::DefaultsWin => LabelPrecedence::DefaultsWin,
            LabelPrecedenceConfig::CallerWins => LabelPrecedence::CallerWins,
        }
    }
}

impl ServiceConfig {
    /// Programmatic config: no prefix, all interfaces, no default labels.
    pub fn new(port: u16) -> Self {
        Self {
            version: 1,
            prefix: String::new(),
            listen_address: default_listen_address(),
            port,
            path: default_path(),
            default_labels: BTreeMap::new(),
            label_precedence: LabelPrecedenceConfig::default(),
            name_label: false,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_listen_address(mut self, addr: impl Into<String>) -> Self {
        self.listen_address = addr.into();
        self
    }

    pub fn with_default_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_labels.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricError::Configuration(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.validate_listen_address()?;

        crate::router::validate_path(&self.path)?;

        for name in self.default_labels.keys() {
            validate_label_name(name)
                .map_err(|e| MetricError::Configuration(format!("default_labels: {e}")))?;
        }

        Ok(())
    }

    /// Accepts an IP literal or a host name; resolution happens at bind time.
    /// A `host:port` form is rejected, the port has its own field.
    fn validate_listen_address(&self) -> Result<()> {
        let addr = self.listen_address.as_str();
        let host_like = !addr.is_empty()
            && addr
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if host_like || addr.parse::<IpAddr>().is_ok() {
            return Ok(());
        }
        Err(MetricError::Configuration(format!(
            "listen_address {addr:?} is neither a host name nor an IP address"
        )))
    }

    pub fn default_labels(&self) -> DefaultLabels {
        DefaultLabels::new(self.default_labels.clone())
            .with_precedence(self.label_precedence.into())
            .with_name_label(self.name_label)
    }
}

fn default_listen_address() -> String {
    "0.0.0.0".into()
}

fn default_path() -> String {
    "/metrics".into()
}
