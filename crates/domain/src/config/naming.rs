use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Which naming backend the resolvers query for service instances.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NamingBackend {
    /// Services listed in this file under `[[naming.services]]`.
    #[default]
    Static,

    /// Polaris naming server reached over its HTTP API.
    Polaris,
}

impl NamingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Polaris => "polaris",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamingConfig {
    #[serde(default)]
    pub backend: NamingBackend,

    /// Polaris HTTP endpoints, e.g. `127.0.0.1:8090`. Tried in order.
    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default = "default_naming_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub services: Vec<StaticService>,
}

impl NamingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            backend: NamingBackend::default(),
            addresses: Vec::new(),
            timeout_ms: default_naming_timeout_ms(),
            services: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticService {
    pub namespace: String,

    pub service: String,

    #[serde(default)]
    pub business: Option<String>,

    #[serde(default)]
    pub instances: Vec<StaticInstance>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticInstance {
    pub host: String,

    pub port: u16,

    #[serde(default)]
    pub priority: u16,

    #[serde(default = "default_weight")]
    pub weight: u16,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_naming_timeout_ms() -> u64 {
    1000
}

fn default_weight() -> u16 {
    100
}
