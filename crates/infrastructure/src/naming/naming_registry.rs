use async_trait::async_trait;
use ferrous_mesh_application::ports::{NamingClient, ServiceRegistry};
use ferrous_mesh_domain::DomainError;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Mesh members taken from the naming backend's service list.
pub struct NamingServiceRegistry {
    naming: Arc<dyn NamingClient>,
    business: Option<String>,
}

impl NamingServiceRegistry {
    pub fn new(naming: Arc<dyn NamingClient>, business: Option<String>) -> Self {
        Self { naming, business }
    }
}

#[async_trait]
impl ServiceRegistry for NamingServiceRegistry {
    fn kind(&self) -> &'static str {
        "naming"
    }

    async fn current_services(&self) -> Result<BTreeSet<String>, DomainError> {
        self.naming
            .get_services(self.business.as_deref())
            .await
            .map_err(|e| DomainError::RegistryUnavailable(e.to_string()))
    }
}
