use async_trait::async_trait;
use ferrous_mesh_domain::DomainError;
use std::collections::BTreeSet;

/// Source of the member names the mesh proxy answers for.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Registry kind, for logs.
    fn kind(&self) -> &'static str;

    /// Current members as `<service>.<namespace>` without trailing dot.
    async fn current_services(&self) -> Result<BTreeSet<String>, DomainError>;
}
