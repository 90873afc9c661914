use serde::{Deserialize, Serialize};

/// HTTP front-end serving `/health` and the resolver debug handlers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebuggerConfig {
    #[serde(default = "default_true")]
    pub enable: bool,

    #[serde(default = "default_debugger_port")]
    pub port: u16,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            enable: default_true(),
            port: default_debugger_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_debugger_port() -> u16 {
    50000
}
