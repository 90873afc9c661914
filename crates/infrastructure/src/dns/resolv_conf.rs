//! `/etc/resolv.conf` reader used when recursion or search domains are not
//! configured explicitly.

use super::records::to_fqdn;
use ferrous_mesh_domain::{DomainError, NameServerAddr};
use resolv_conf::ScopedIp;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";
const DNS_PORT: u16 = 53;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvConf {
    pub nameservers: Vec<NameServerAddr>,
    /// Search domains as FQDNs (trailing dot).
    pub search: Vec<String>,
}

impl ResolvConf {
    /// Nameservers always use port 53; the last `search` or `domain` line
    /// supplies the search list.
    pub fn parse(content: &str) -> Result<Self, DomainError> {
        let parsed = resolv_conf::Config::parse(content)
            .map_err(|e| DomainError::IoError(format!("Invalid resolv.conf: {}", e)))?;

        let nameservers = parsed
            .nameservers
            .iter()
            .map(|ns| {
                let ip = match ns {
                    ScopedIp::V4(ip) => IpAddr::V4(*ip),
                    ScopedIp::V6(ip, _) => IpAddr::V6(*ip),
                };
                NameServerAddr::new(SocketAddr::new(ip, DNS_PORT))
            })
            .collect();
        let search = parsed
            .get_last_search_or_domain()
            .map(|domain| to_fqdn(domain))
            .collect();

        Ok(Self {
            nameservers,
            search,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let conf = Self::parse(&content)?;
        debug!(
            path = %path.display(),
            nameservers = conf.nameservers.len(),
            search = conf.search.len(),
            "Loaded resolver configuration"
        );
        Ok(conf)
    }

    /// Nameservers usable for recursion. With `skip_localhost` set, an entry
    /// of 127.0.0.1 is dropped since it would loop back into this server.
    pub fn upstreams(&self, skip_localhost: bool) -> Vec<NameServerAddr> {
        self.nameservers
            .iter()
            .filter(|ns| !(skip_localhost && ns.socket_addr().ip() == IpAddr::V4(Ipv4Addr::LOCALHOST)))
            .copied()
            .collect()
    }
}
