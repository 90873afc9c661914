use async_trait::async_trait;
use ferrous_mesh_domain::{DomainError, ServiceInstance, ServiceKey};
use std::collections::{BTreeSet, HashMap};

/// Port to the naming subsystem that owns service membership.
#[async_trait]
pub trait NamingClient: Send + Sync {
    /// All healthy instances of `key`, in backend order. `route_labels` narrows
    /// the result to instances carrying those labels.
    async fn get_instances(
        &self,
        key: &ServiceKey,
        route_labels: &HashMap<String, String>,
    ) -> Result<Vec<ServiceInstance>, DomainError>;

    /// One instance chosen by the backend. Defaults to the first of
    /// [`get_instances`](Self::get_instances).
    async fn get_one_instance(
        &self,
        key: &ServiceKey,
        route_labels: &HashMap<String, String>,
    ) -> Result<Option<ServiceInstance>, DomainError> {
        Ok(self
            .get_instances(key, route_labels)
            .await?
            .into_iter()
            .next())
    }

    /// Every known service as `<service>.<namespace>`, optionally restricted
    /// to one business tag.
    async fn get_services(&self, business: Option<&str>) -> Result<BTreeSet<String>, DomainError>;
}
