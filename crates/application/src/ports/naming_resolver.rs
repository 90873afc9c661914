use async_trait::async_trait;
use ferrous_mesh_domain::{DomainError, ResolverConfigEntry, TransportProtocol};
use hickory_proto::op::{Message, Query};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-query facts a resolver may need besides the question itself.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext {
    pub protocol: TransportProtocol,
    pub client: Option<SocketAddr>,
}

impl QueryContext {
    pub fn new(protocol: TransportProtocol) -> Self {
        Self {
            protocol,
            client: None,
        }
    }

    pub fn with_client(mut self, client: SocketAddr) -> Self {
        self.client = Some(client);
        self
    }
}

pub type DebugHandlerFn = Arc<dyn Fn() -> serde_json::Value + Send + Sync>;

/// A `{path, handler}` pair served by the debug HTTP front-end.
#[derive(Clone)]
pub struct DebugHandler {
    pub path: String,
    pub handler: DebugHandlerFn,
}

impl DebugHandler {
    pub fn new(path: impl Into<String>, handler: DebugHandlerFn) -> Self {
        Self {
            path: path.into(),
            handler,
        }
    }

    pub fn render(&self) -> serde_json::Value {
        (self.handler)()
    }
}

impl fmt::Debug for DebugHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugHandler")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A pluggable naming back-end in the resolver chain.
#[async_trait]
pub trait NamingResolver: Send + Sync {
    /// Stable identifier matched against `[[resolvers]].name`.
    fn name(&self) -> &'static str;

    /// Parses the entry's options and builds upstream clients. Called once,
    /// before the resolver is shared.
    fn initialize(&mut self, entry: &ResolverConfigEntry) -> Result<(), DomainError>;

    /// Launches background work tied to `shutdown`. Must not block.
    fn start(&self, _shutdown: CancellationToken) {}

    /// Releases resources. Safe to call on a resolver that never started.
    fn destroy(&self) {}

    /// Answers `question` or returns `None` to let the next resolver try.
    ///
    /// `qname` is the question name after search-domain stripping. Failures
    /// are logged and reported as `None`; a returned message is authoritative
    /// with a NOERROR code.
    async fn serve_dns(&self, ctx: &QueryContext, question: &Query, qname: &str)
        -> Option<Message>;

    fn debug_handlers(&self) -> Vec<DebugHandler> {
        Vec::new()
    }
}
