use super::filter_by_labels;
use async_trait::async_trait;
use ferrous_mesh_application::ports::NamingClient;
use ferrous_mesh_domain::config::{NamingConfig, StaticService};
use ferrous_mesh_domain::{DomainError, ServiceInstance, ServiceKey};
use std::collections::{BTreeSet, HashMap};

/// Naming backend served from `[[naming.services]]`.
#[derive(Debug, Clone, Default)]
pub struct StaticNamingClient {
    services: Vec<StaticService>,
}

impl StaticNamingClient {
    pub fn new(services: Vec<StaticService>) -> Self {
        Self { services }
    }

    pub fn from_config(config: &NamingConfig) -> Self {
        Self::new(config.services.clone())
    }

    fn find(&self, key: &ServiceKey) -> Option<&StaticService> {
        self.services.iter().find(|svc| {
            svc.namespace.eq_ignore_ascii_case(&key.namespace)
                && svc.service.eq_ignore_ascii_case(&key.service)
        })
    }
}

#[async_trait]
impl NamingClient for StaticNamingClient {
    async fn get_instances(
        &self,
        key: &ServiceKey,
        route_labels: &HashMap<String, String>,
    ) -> Result<Vec<ServiceInstance>, DomainError> {
        let Some(service) = self.find(key) else {
            return Ok(Vec::new());
        };

        let instances = service
            .instances
            .iter()
            .map(|instance| ServiceInstance {
                host: instance.host.clone(),
                port: instance.port,
                priority: instance.priority,
                weight: instance.weight,
                metadata: instance.metadata.clone(),
            })
            .collect();
        Ok(filter_by_labels(instances, route_labels))
    }

    async fn get_services(&self, business: Option<&str>) -> Result<BTreeSet<String>, DomainError> {
        Ok(self
            .services
            .iter()
            .filter(|svc| business.is_none() || svc.business.as_deref() == business)
            .map(|svc| ServiceKey::new(&svc.namespace, &svc.service).to_string())
            .collect())
    }
}
