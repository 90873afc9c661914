use serde::{Deserialize, Serialize};

use super::debugger::DebuggerConfig;
use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::naming::{NamingBackend, NamingConfig};
use super::recurse::RecurseConfig;
use super::resolver::{default_resolvers, ResolverConfigEntry};
use super::server::ServerConfig;

/// Main configuration structure for Ferrous Mesh
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Namespace the sidecar itself runs in; used to qualify bare names
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Namespace the reserved `polaris` token resolves to
    #[serde(default = "default_system_namespace")]
    pub system_namespace: String,

    /// Listener configuration (bind address, port)
    #[serde(default)]
    pub server: ServerConfig,

    /// Recursive forwarding to upstream nameservers
    #[serde(default)]
    pub recurse: RecurseConfig,

    /// Query preprocessing and chain deadline
    #[serde(default)]
    pub dns: DnsConfig,

    /// Ordered resolver chain
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<ResolverConfigEntry>,

    /// Naming backend used by the resolvers
    #[serde(default)]
    pub naming: NamingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Debug HTTP front-end
    #[serde(default)]
    pub debugger: DebuggerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            system_namespace: default_system_namespace(),
            server: ServerConfig::default(),
            recurse: RecurseConfig::default(),
            dns: DnsConfig::default(),
            resolvers: default_resolvers(),
            naming: NamingConfig::default(),
            logging: LoggingConfig::default(),
            debugger: DebuggerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-mesh.toml in current directory
    /// 3. /etc/ferrous-mesh/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(port) = overrides.debugger_port {
            self.debugger.port = port;
        }
        if let Some(namespace) = overrides.namespace {
            self.namespace = namespace;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind_ip()?;

        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.recurse.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Recurse timeout must be greater than 0".to_string(),
            ));
        }

        if self.resolvers.is_empty() {
            return Err(ConfigError::Validation(
                "No resolvers configured".to_string(),
            ));
        }

        for entry in &self.resolvers {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "Resolver name cannot be empty".to_string(),
                ));
            }
        }

        if !self.resolvers.iter().any(|entry| entry.enable) {
            return Err(ConfigError::Validation(
                "At least one resolver must be enabled".to_string(),
            ));
        }

        if self.naming.backend == NamingBackend::Polaris && self.naming.addresses.is_empty() {
            return Err(ConfigError::Validation(
                "Naming backend 'polaris' requires at least one address".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("ferrous-mesh.toml").exists() {
            Some("ferrous-mesh.toml".to_string())
        } else if std::path::Path::new("/etc/ferrous-mesh/config.toml").exists() {
            Some("/etc/ferrous-mesh/config.toml".to_string())
        } else {
            None
        }
    }

    pub fn enabled_resolvers(&self) -> impl Iterator<Item = &ResolverConfigEntry> {
        self.resolvers.iter().filter(|entry| entry.enable)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub debugger_port: Option<u16>,
    pub namespace: Option<String>,
    pub log_level: Option<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_system_namespace() -> String {
    "Polaris".to_string()
}
