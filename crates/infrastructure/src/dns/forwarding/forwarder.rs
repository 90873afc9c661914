use super::response_parser::ResponseParser;
use crate::dns::transport::create_transport;
use async_trait::async_trait;
use ferrous_mesh_application::ports::UpstreamForwarder;
use ferrous_mesh_domain::{DomainError, NameServerAddr, TransportProtocol};
use hickory_proto::op::Message;
use std::time::Duration;
use tracing::{debug, warn};

/// Forwards unanswered queries to upstream nameservers, in order, over the
/// protocol the query arrived on.
pub struct RecursiveForwarder {
    upstreams: Vec<NameServerAddr>,
    timeout: Duration,
}

impl RecursiveForwarder {
    pub fn new(upstreams: Vec<NameServerAddr>, timeout: Duration) -> Self {
        Self { upstreams, timeout }
    }

    pub fn upstreams(&self) -> &[NameServerAddr] {
        &self.upstreams
    }

    async fn exchange(
        &self,
        upstream: &NameServerAddr,
        request: &Message,
        request_bytes: &[u8],
        protocol: TransportProtocol,
    ) -> Result<Message, DomainError> {
        let transport = create_transport(protocol, upstream.socket_addr());
        let response = transport.send(request_bytes, self.timeout).await?;
        ResponseParser::parse(&response.bytes, request)
    }
}

#[async_trait]
impl UpstreamForwarder for RecursiveForwarder {
    async fn forward(
        &self,
        request: &Message,
        protocol: TransportProtocol,
    ) -> Result<Message, DomainError> {
        let request_bytes = request
            .to_vec()
            .map_err(|e| DomainError::InvalidDnsResponse(format!("Failed to encode query: {}", e)))?;

        for upstream in &self.upstreams {
            match self.exchange(upstream, request, &request_bytes, protocol).await {
                Ok(response) if ResponseParser::is_acceptable(&response) => {
                    debug!(
                        upstream = %upstream,
                        protocol = %protocol,
                        rcode = ?response.response_code(),
                        "Upstream answered"
                    );
                    return Ok(response);
                }
                Ok(response) => {
                    warn!(
                        upstream = %upstream,
                        rcode = ?response.response_code(),
                        "Upstream returned failure code, trying next"
                    );
                }
                Err(e) => {
                    warn!(upstream = %upstream, error = %e, "Upstream exchange failed, trying next");
                }
            }
        }

        Err(DomainError::TransportAllServersUnreachable)
    }
}
