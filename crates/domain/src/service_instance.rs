use std::collections::HashMap;
use std::net::IpAddr;

/// One endpoint of a service as reported by the naming backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub host: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
    pub metadata: HashMap<String, String>,
}

impl ServiceInstance {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            priority: 0,
            weight: 100,
            metadata: HashMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Parsed host address; `None` when the backend reported a hostname.
    pub fn ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }

    /// True when every label is present in the instance metadata with the
    /// same value.
    pub fn matches_labels(&self, labels: &HashMap<String, String>) -> bool {
        labels
            .iter()
            .all(|(key, value)| self.metadata.get(key) == Some(value))
    }
}
