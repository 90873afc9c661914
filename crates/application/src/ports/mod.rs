mod naming_client;
mod naming_resolver;
mod service_registry;
mod upstream_forwarder;

pub use naming_client::NamingClient;
pub use naming_resolver::{DebugHandler, DebugHandlerFn, NamingResolver, QueryContext};
pub use service_registry::ServiceRegistry;
pub use upstream_forwarder::UpstreamForwarder;

// Re-export for convenience
pub use ferrous_mesh_domain::{ServiceInstance, ServiceKey};
