//! Typed views of the `[[resolvers]].option` tables.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Parses `"k:v,k2:v2"` into a label map. A token without `:` maps to itself.
pub fn parse_route_labels(value: &str) -> HashMap<String, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once(':') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (token.to_string(), token.to_string()),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryOptions {
    #[serde(default)]
    pub route_labels: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl DiscoveryOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnsAgentOptions {
    #[serde(default)]
    pub route_labels: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_a_answers")]
    pub max_a_answers: usize,

    #[serde(default = "default_max_srv_answers")]
    pub max_srv_answers: usize,
}

impl DnsAgentOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_max_a_answers() -> usize {
    20
}

fn default_max_srv_answers() -> usize {
    10
}
