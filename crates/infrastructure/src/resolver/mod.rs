pub mod discovery;
pub mod dnsagent;
pub mod meshproxy;
pub mod options;
pub mod registry;

pub use discovery::DiscoveryResolver;
pub use dnsagent::DnsAgentResolver;
pub use meshproxy::MeshProxyResolver;
pub use registry::{ResolverContext, ResolverFactory, ResolverRegistry};

use ferrous_mesh_application::ports::NamingClient;
use ferrous_mesh_domain::{ServiceInstance, ServiceKey};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const DISCOVERY: &str = "discovery";
pub const DNSAGENT: &str = "dnsagent";
pub const MESHPROXY: &str = "meshproxy";

/// Fetches instances of `key` within `timeout`. Failures are logged and
/// reported as an empty list so the chain moves on.
pub(crate) async fn lookup_instances(
    resolver: &'static str,
    naming: &Arc<dyn NamingClient>,
    key: &ServiceKey,
    route_labels: &HashMap<String, String>,
    timeout: Duration,
    one: bool,
) -> Vec<ServiceInstance> {
    let lookup = async {
        if one {
            naming
                .get_one_instance(key, route_labels)
                .await
                .map(|instance| instance.into_iter().collect())
        } else {
            naming.get_instances(key, route_labels).await
        }
    };

    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(instances)) => instances,
        Ok(Err(e)) => {
            warn!(resolver, service = %key, error = %e, "Naming lookup failed");
            Vec::new()
        }
        Err(_) => {
            warn!(
                resolver,
                service = %key,
                timeout_ms = timeout.as_millis() as u64,
                "Naming lookup timed out"
            );
            Vec::new()
        }
    }
}
