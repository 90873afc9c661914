use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Free-form option bag of a resolver entry, decoded by each resolver into
/// its own typed options.
pub type ResolverOptions = serde_json::Map<String, serde_json::Value>;

/// One `[[resolvers]]` entry. The chain is built from the enabled entries in
/// the order they appear in the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfigEntry {
    pub name: String,

    #[serde(default = "default_suffix")]
    pub suffix: String,

    #[serde(default)]
    pub dns_ttl: u32,

    #[serde(default)]
    pub enable: bool,

    #[serde(default)]
    pub option: ResolverOptions,
}

impl ResolverConfigEntry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            suffix: default_suffix(),
            dns_ttl: 0,
            enable: true,
            option: ResolverOptions::new(),
        }
    }

    /// Decodes the option bag into `T`. Missing keys take `T`'s serde defaults.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(serde_json::Value::Object(self.option.clone())).map_err(|e| {
            DomainError::InvalidResolverOption(format!("resolver '{}': {}", self.name, e))
        })
    }

    /// Suffix with a guaranteed trailing dot, the form query names carry.
    pub fn fqdn_suffix(&self) -> String {
        if self.suffix.ends_with('.') {
            self.suffix.clone()
        } else {
            format!("{}.", self.suffix)
        }
    }
}

pub(crate) fn default_resolvers() -> Vec<ResolverConfigEntry> {
    let mut meshproxy_option = ResolverOptions::new();
    meshproxy_option.insert("reload_interval_sec".to_string(), 30.into());
    meshproxy_option.insert("dns_answer_ip".to_string(), "10.4.4.4".into());

    vec![
        ResolverConfigEntry {
            name: "dnsagent".to_string(),
            suffix: default_suffix(),
            dns_ttl: 10,
            enable: true,
            option: ResolverOptions::new(),
        },
        ResolverConfigEntry {
            name: "meshproxy".to_string(),
            suffix: default_suffix(),
            dns_ttl: 120,
            enable: false,
            option: meshproxy_option,
        },
    ]
}

fn default_suffix() -> String {
    ".".to_string()
}
