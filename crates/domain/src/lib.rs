//! Ferrous Mesh Domain Layer
pub mod config;
pub mod dns_protocol;
pub mod errors;
pub mod service_instance;
pub mod service_key;

pub use config::{CliOverrides, Config, ConfigError, ResolverConfigEntry};
pub use dns_protocol::{NameServerAddr, TransportProtocol};
pub use errors::DomainError;
pub use service_instance::ServiceInstance;
pub use service_key::{match_suffix, QnameParser, ServiceKey, RESERVED_NAMESPACE};
