use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Client search domains stripped from query names before the resolver
    /// chain sees them. Empty means "use the `search` line of /etc/resolv.conf".
    #[serde(default)]
    pub search_domains: Vec<String>,

    /// Upper bound for the whole resolver chain of a single query. When it
    /// elapses the remaining resolvers are skipped and recursion takes over.
    #[serde(default)]
    pub resolver_deadline_ms: Option<u64>,
}

impl DnsConfig {
    pub fn resolver_deadline(&self) -> Option<Duration> {
        self.resolver_deadline_ms.map(Duration::from_millis)
    }
}
