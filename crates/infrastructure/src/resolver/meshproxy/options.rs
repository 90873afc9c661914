use serde::Deserialize;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Where the mesh proxy learns its member names from.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// `get_services` of the naming backend.
    #[default]
    Naming,
    /// Cluster names from an Envoy admin endpoint.
    Envoy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeshProxyOptions {
    #[serde(default)]
    pub registry: RegistryKind,

    #[serde(default = "default_registry_host")]
    pub registry_host: String,

    #[serde(default = "default_registry_port")]
    pub registry_port: u16,

    #[serde(default = "default_reload_interval_sec")]
    pub reload_interval_sec: u64,

    #[serde(default)]
    pub dns_answer_ip: Option<Ipv4Addr>,

    #[serde(default)]
    pub dns_answer_ip6: Option<Ipv6Addr>,

    #[serde(default)]
    pub filter_by_business: Option<String>,
}

impl MeshProxyOptions {
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_sec.max(1))
    }

    pub fn answer_ipv4(&self) -> Vec<Ipv4Addr> {
        self.dns_answer_ip.into_iter().collect()
    }

    pub fn answer_ipv6(&self) -> Vec<Ipv6Addr> {
        self.dns_answer_ip6.into_iter().collect()
    }

    /// Business filter with empty strings treated as unset.
    pub fn business(&self) -> Option<&str> {
        self.filter_by_business
            .as_deref()
            .filter(|business| !business.is_empty())
    }
}

fn default_registry_host() -> String {
    "127.0.0.1".to_string()
}

fn default_registry_port() -> u16 {
    15000
}

fn default_reload_interval_sec() -> u64 {
    30
}
