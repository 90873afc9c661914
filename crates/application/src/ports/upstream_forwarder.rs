use async_trait::async_trait;
use ferrous_mesh_domain::{DomainError, TransportProtocol};
use hickory_proto::op::Message;

/// Recursive resolution against upstream nameservers.
#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    /// Sends `request` upstream over `protocol` and returns the first
    /// acceptable response. Fails once every upstream has been tried.
    async fn forward(
        &self,
        request: &Message,
        protocol: TransportProtocol,
    ) -> Result<Message, DomainError>;
}
