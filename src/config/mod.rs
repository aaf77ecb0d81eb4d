/// Configuration lookup for maas-admin
use anyhow::Context;
use serde_yaml::Value;
use std::path::Path;
use tracing::debug;

use crate::maas::error::MaasError;

/// Key prefix for MAAS settings
const PREFIX: &str = "maas.";

/// Default API endpoint when none is configured
pub const DEFAULT_URL: &str = "https://localhost/";

/// Read-only configuration source
pub trait ConfigLookup {
    /// Look up a dotted key such as `maas.url`
    fn get(&self, key: &str) -> Option<String>;
}

/// Agent configuration: minion options consulted before pillar data
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    layers: Vec<Value>,
}

impl AgentConfig {
    /// Build from already-parsed layers, highest priority first
    pub fn from_layers(layers: Vec<Value>) -> Self {
        Self { layers }
    }

    /// Load minion options and optional pillar data from YAML files
    pub fn load(options: Option<&Path>, pillar: Option<&Path>) -> anyhow::Result<Self> {
        let mut layers = Vec::new();
        for path in [options, pillar].into_iter().flatten() {
            layers.push(Self::read_layer(path)?);
        }
        Ok(Self::from_layers(layers))
    }

    fn read_layer(path: &Path) -> anyhow::Result<Value> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))
    }
}

impl ConfigLookup for AgentConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| lookup(layer, key))
    }
}

/// Resolve a key in one layer, as a literal flat key first, then as a nested path
fn lookup(layer: &Value, key: &str) -> Option<String> {
    let mapping = layer.as_mapping()?;
    if let Some(value) = mapping.get(key) {
        return scalar_text(value);
    }

    let mut current = layer;
    for segment in key.split('.') {
        current = current.as_mapping()?.get(segment)?;
    }
    scalar_text(current)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Per-call credential overrides (`connection_token`, `connection_url`).
///
/// Set fields take precedence over configured values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub token: Option<String>,
    pub url: Option<String>,
}

/// Credentials resolved for one call
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub base_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ConnectionOptions {
    fn get(&self, key: &str, config: &dyn ConfigLookup) -> Option<String> {
        let explicit = match key {
            "token" => self.token.clone(),
            "url" => self.url.clone(),
            _ => None,
        };
        explicit.or_else(|| config.get(&format!("{}{}", PREFIX, key)))
    }

    /// Resolve credentials, overrides first, then configuration
    pub fn resolve(&self, config: &dyn ConfigLookup) -> Result<Credentials, MaasError> {
        let token = self
            .get("token", config)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                MaasError::Configuration(
                    "MAAS token not found. Pass --connection-token or set maas.token in the configuration"
                        .to_string(),
                )
            })?;
        let base_url = self
            .get("url", config)
            .unwrap_or_else(|| DEFAULT_URL.to_string());

        Ok(Credentials { token, base_url })
    }
}
