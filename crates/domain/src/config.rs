pub mod debugger;
pub mod dns;
pub mod errors;
pub mod logging;
pub mod naming;
pub mod recurse;
pub mod resolver;
pub mod root;
pub mod server;

pub use debugger::DebuggerConfig;
pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use naming::{NamingBackend, NamingConfig, StaticInstance, StaticService};
pub use recurse::RecurseConfig;
pub use resolver::{ResolverConfigEntry, ResolverOptions};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
