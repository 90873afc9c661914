use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_dns_port")]
    pub dns_port: u16,
}

impl ServerConfig {
    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        self.bind_address.trim().parse().map_err(|_| {
            ConfigError::Validation(format!(
                "Bind address '{}' is not an IP address",
                self.bind_address
            ))
        })
    }

    /// Listener address for `port` on the bind IP. IPv6 binds are bracketed
    /// correctly, unlike a `"{ip}:{port}"` string.
    pub fn socket_addr(&self, port: u16) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::new(self.bind_ip()?, port))
    }

    /// True when the listener is bound to loopback or to every interface.
    ///
    /// A nameserver entry of 127.0.0.1 in resolv.conf would then point back at
    /// this process, so recursion must skip it.
    pub fn binds_localhost(&self) -> bool {
        self.bind_ip()
            .map(|ip| ip.is_loopback() || ip.is_unspecified())
            .unwrap_or(false)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            dns_port: default_dns_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dns_port() -> u16 {
    53
}
