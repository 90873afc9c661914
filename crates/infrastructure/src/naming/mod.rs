pub mod envoy_registry;
pub mod naming_registry;
pub mod polaris_client;
pub mod static_client;

pub use envoy_registry::EnvoyRegistry;
pub use naming_registry::NamingServiceRegistry;
pub use polaris_client::PolarisNamingClient;
pub use static_client::StaticNamingClient;

use ferrous_mesh_application::ports::NamingClient;
use ferrous_mesh_domain::config::{NamingBackend, NamingConfig};
use ferrous_mesh_domain::{DomainError, ServiceInstance};
use std::collections::HashMap;
use std::sync::Arc;

/// Naming client for the configured backend.
pub fn create_naming_client(config: &NamingConfig) -> Result<Arc<dyn NamingClient>, DomainError> {
    Ok(match config.backend {
        NamingBackend::Static => Arc::new(StaticNamingClient::from_config(config)),
        NamingBackend::Polaris => Arc::new(PolarisNamingClient::new(
            config.addresses.clone(),
            config.timeout(),
        )?),
    })
}

/// Keeps instances carrying every route label. Falls back to all instances
/// when none match, so a label mismatch never hides a live service.
pub(crate) fn filter_by_labels(
    instances: Vec<ServiceInstance>,
    labels: &HashMap<String, String>,
) -> Vec<ServiceInstance> {
    if labels.is_empty() {
        return instances;
    }
    let matching: Vec<ServiceInstance> = instances
        .iter()
        .filter(|instance| instance.matches_labels(labels))
        .cloned()
        .collect();
    if matching.is_empty() {
        instances
    } else {
        matching
    }
}
