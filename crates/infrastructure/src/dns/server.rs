use super::edns::set_edns;
use super::forwarding::RecursiveForwarder;
use super::records::to_fqdn;
use super::resolv_conf::ResolvConf;
use super::truncation::{max_response_size, truncate_response};
use crate::resolver::{ResolverContext, ResolverRegistry};
use ferrous_mesh_application::ports::{
    DebugHandler, NamingClient, NamingResolver, QueryContext, UpstreamForwarder,
};
use ferrous_mesh_application::use_cases::HandleDnsQueryUseCase;
use ferrous_mesh_domain::{Config, DomainError, NameServerAddr, TransportProtocol};
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::xfer::Protocol;
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Wire-level entry point shared by the UDP and TCP listeners.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
    recursion_available: bool,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self {
            use_case,
            recursion_available: false,
        }
    }

    pub fn with_recursion_available(mut self, recursion_available: bool) -> Self {
        self.recursion_available = recursion_available;
        self
    }

    /// Handles one wire message and returns the encoded reply.
    ///
    /// Undecodable requests get FORMERR when their id can be read; inbound
    /// responses and fragments shorter than an id are dropped.
    pub async fn handle_raw(
        &self,
        request_bytes: &[u8],
        protocol: TransportProtocol,
        client: Option<SocketAddr>,
    ) -> Option<Vec<u8>> {
        let request = match Message::from_vec(request_bytes) {
            Ok(request) => request,
            Err(e) => {
                debug!(client = ?client, error = %e, "Malformed DNS request");
                return format_error(request_bytes);
            }
        };

        if request.message_type() == MessageType::Response {
            debug!(client = ?client, "Dropping inbound response message");
            return None;
        }

        let mut ctx = QueryContext::new(protocol);
        if let Some(client) = client {
            ctx = ctx.with_client(client);
        }

        let response = self.handle_message(&request, &ctx).await;
        match response.to_vec() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(error = %e, id = request.id(), "Failed to encode response");
                let mut fallback = Message::new();
                prepare_reply(&request, &mut fallback, self.recursion_available);
                fallback.set_response_code(ResponseCode::ServFail);
                fallback.to_vec().ok()
            }
        }
    }

    /// Runs the resolver chain and applies reply headers, EDNS echo and size
    /// limits for `ctx.protocol`.
    pub async fn handle_message(&self, request: &Message, ctx: &QueryContext) -> Message {
        let outcome = self.use_case.execute(request, ctx).await;
        let needs_reply_headers = outcome.needs_reply_headers();
        let source = outcome.source.as_str();
        let mut response = outcome.response;

        if needs_reply_headers {
            prepare_reply(request, &mut response, self.recursion_available);
            set_edns(request, &mut response, true);
        }

        let max_size = max_response_size(ctx.protocol, request);
        match truncate_response(&mut response, ctx.protocol, max_size) {
            Ok(true) => debug!(
                source,
                max_size,
                answers = response.answer_count(),
                "Response truncated"
            ),
            Ok(false) => {}
            Err(e) => warn!(source, error = %e, "Failed to size response"),
        }

        response
    }
}

#[async_trait::async_trait]
impl RequestHandler for DnsServerHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let protocol = match request.protocol() {
            Protocol::Udp => TransportProtocol::Udp,
            _ => TransportProtocol::Tcp,
        };
        let ctx = QueryContext::new(protocol).with_client(request.src());

        let reply = self.handle_message(&to_message(request), &ctx).await;

        let mut builder = MessageResponseBuilder::from_message_request(request);
        if let Some(edns) = reply.extensions().clone() {
            builder.edns(edns);
        }
        let response = builder.build(
            *reply.header(),
            reply.answers().iter(),
            reply.name_servers().iter(),
            &[],
            reply.additionals().iter(),
        );

        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                error!(client = %request.src(), error = %e, "Failed to send response");
                ResponseInfo::from(*request.header())
            }
        }
    }
}

/// Rebuilds the plain message view of a request decoded by the server.
fn to_message(request: &Request) -> Message {
    let mut message = Message::new();
    message.set_header(*request.header());
    message.add_queries(request.queries().iter().map(|query| query.original().clone()));
    if let Some(edns) = request.edns() {
        message.set_edns(edns.clone());
    }
    message
}

/// Copies the request's id, opcode, RD bit and question onto `response`.
fn prepare_reply(request: &Message, response: &mut Message, recursion_available: bool) {
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_recursion_available(recursion_available);
    if response.queries().is_empty() {
        response.add_queries(request.queries().to_vec());
    }
}

fn format_error(request_bytes: &[u8]) -> Option<Vec<u8>> {
    let id = u16::from_be_bytes([*request_bytes.first()?, *request_bytes.get(1)?]);
    let mut response = Message::new();
    response
        .set_id(id)
        .set_message_type(MessageType::Response)
        .set_response_code(ResponseCode::FormErr);
    response.to_vec().ok()
}

/// The resolver chain with its resolvers' lifecycle.
pub struct DnsServer {
    handler: Arc<DnsServerHandler>,
    resolvers: Vec<Arc<dyn NamingResolver>>,
}

impl DnsServer {
    /// Builds the chain from `config`. Unset recursion nameservers and search
    /// domains come from `resolv_conf`.
    pub fn build(
        config: &Config,
        registry: &ResolverRegistry,
        naming: Arc<dyn NamingClient>,
        resolv_conf: &ResolvConf,
    ) -> Result<Self, DomainError> {
        let forwarder = if config.recurse.enable {
            let upstreams = recursion_upstreams(config, resolv_conf)?;
            if upstreams.is_empty() {
                warn!("Recursion enabled without any upstream nameserver");
            }
            info!(
                upstreams = ?upstreams.iter().map(ToString::to_string).collect::<Vec<_>>(),
                timeout_secs = config.recurse.timeout_secs,
                "Recursion enabled"
            );
            Some(Arc::new(RecursiveForwarder::new(upstreams, config.recurse.timeout()))
                as Arc<dyn UpstreamForwarder>)
        } else {
            None
        };

        let search_domains: Vec<String> = if config.dns.search_domains.is_empty() {
            resolv_conf.search.clone()
        } else {
            config
                .dns
                .search_domains
                .iter()
                .map(String::as_str)
                .map(to_fqdn)
                .collect()
        };

        let ctx = ResolverContext {
            naming,
            namespace: config.namespace.clone(),
            system_namespace: config.system_namespace.clone(),
        };
        let resolvers = registry.build_chain(&config.resolvers, &ctx)?;

        info!(
            resolvers = ?resolvers.iter().map(|r| r.name()).collect::<Vec<_>>(),
            search_domains = ?search_domains,
            "Resolver chain ready"
        );

        let mut use_case = HandleDnsQueryUseCase::new(resolvers.clone())
            .with_search_domains(search_domains)
            .with_resolver_deadline(config.dns.resolver_deadline());
        if let Some(forwarder) = forwarder {
            use_case = use_case.with_forwarder(forwarder);
        }

        let handler = DnsServerHandler::new(Arc::new(use_case))
            .with_recursion_available(config.recurse.enable);

        Ok(Self {
            handler: Arc::new(handler),
            resolvers,
        })
    }

    pub fn handler(&self) -> Arc<DnsServerHandler> {
        Arc::clone(&self.handler)
    }

    pub fn resolvers(&self) -> &[Arc<dyn NamingResolver>] {
        &self.resolvers
    }

    /// Starts every resolver's background work under `shutdown`.
    pub fn start(&self, shutdown: &CancellationToken) {
        for resolver in &self.resolvers {
            resolver.start(shutdown.clone());
        }
    }

    pub fn debug_handlers(&self) -> Vec<DebugHandler> {
        self.resolvers
            .iter()
            .flat_map(|resolver| resolver.debug_handlers())
            .collect()
    }

    /// Destroys the resolvers, last first.
    pub fn destroy(&self) {
        for resolver in self.resolvers.iter().rev() {
            info!(resolver = resolver.name(), "Destroying resolver");
            resolver.destroy();
        }
    }
}

fn recursion_upstreams(
    config: &Config,
    resolv_conf: &ResolvConf,
) -> Result<Vec<NameServerAddr>, DomainError> {
    if config.recurse.name_servers.is_empty() {
        return Ok(resolv_conf.upstreams(config.server.binds_localhost()));
    }

    config
        .recurse
        .name_servers
        .iter()
        .map(|ns| ns.parse::<NameServerAddr>().map_err(DomainError::InvalidIpAddress))
        .collect()
}
