use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecurseConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upstream nameservers. Empty means "use /etc/resolv.conf".
    #[serde(default)]
    pub name_servers: Vec<String>,
}

impl RecurseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RecurseConfig {
    fn default() -> Self {
        Self {
            enable: false,
            timeout_secs: default_timeout_secs(),
            name_servers: Vec::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    1
}
