use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid query name: {0}")]
    InvalidQname(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid resolver option: {0}")]
    InvalidResolverOption(String),

    #[error("Resolver not registered: {0}")]
    UnknownResolver(String),

    #[error("Failed to initialize resolver {0}: {1}")]
    ResolverInit(String, String),

    #[error("Naming backend error: {0}")]
    NamingBackend(String),

    #[error("Service registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Connection refused by {server}")]
    TransportConnectionRefused { server: String },

    #[error("Connection reset by {server}")]
    TransportConnectionReset { server: String },

    #[error("All upstream nameservers failed")]
    TransportAllServersUnreachable,
}

