use crate::ports::{NamingResolver, QueryContext, UpstreamForwarder};
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Where the response for a query came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Answered by the named resolver in the chain.
    Resolver(&'static str),
    /// Relayed from an upstream nameserver.
    Recursion,
    /// The request carried no question.
    Refused,
    /// Nothing could answer.
    ServFail,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Resolver(name) => name,
            Self::Recursion => "recursion",
            Self::Refused => "refused",
            Self::ServFail => "servfail",
        }
    }
}

#[derive(Debug)]
pub struct DnsOutcome {
    pub response: Message,
    pub source: ResponseSource,
}

impl DnsOutcome {
    fn new(response: Message, source: ResponseSource) -> Self {
        Self { response, source }
    }

    fn code(code: ResponseCode, source: ResponseSource) -> Self {
        let mut response = Message::new();
        response
            .set_message_type(MessageType::Response)
            .set_recursion_available(true)
            .set_response_code(code);
        Self::new(response, source)
    }

    /// Responses built here carry reply headers and EDNS from the request;
    /// relayed upstream responses already have their own.
    pub fn needs_reply_headers(&self) -> bool {
        self.source != ResponseSource::Recursion
    }
}

/// The resolver chain: search-domain stripping, first-answer-wins dispatch
/// over the enabled resolvers, then recursion.
pub struct HandleDnsQueryUseCase {
    resolvers: Vec<Arc<dyn NamingResolver>>,
    search_domains: Vec<String>,
    forwarder: Option<Arc<dyn UpstreamForwarder>>,
    resolver_deadline: Option<Duration>,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolvers: Vec<Arc<dyn NamingResolver>>) -> Self {
        Self {
            resolvers,
            search_domains: Vec::new(),
            forwarder: None,
            resolver_deadline: None,
        }
    }

    pub fn with_search_domains(mut self, search_domains: Vec<String>) -> Self {
        self.search_domains = search_domains
            .into_iter()
            .filter(|domain| !domain.is_empty())
            .collect();
        self
    }

    pub fn with_forwarder(mut self, forwarder: Arc<dyn UpstreamForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn with_resolver_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.resolver_deadline = deadline;
        self
    }

    pub fn resolvers(&self) -> &[Arc<dyn NamingResolver>] {
        &self.resolvers
    }

    /// Strips configured search domains from the end of `qname` until none
    /// matches. Search domains may stack, so one pass is not enough.
    pub fn preprocess(&self, qname: &str) -> String {
        let mut name = qname;
        loop {
            let mut matched = false;
            for search in &self.search_domains {
                if let Some(stripped) = name.strip_suffix(search.as_str()) {
                    if !stripped.is_empty() {
                        name = stripped;
                        matched = true;
                    }
                }
            }
            if !matched {
                return name.to_string();
            }
        }
    }

    pub async fn execute(&self, request: &Message, ctx: &QueryContext) -> DnsOutcome {
        let Some(question) = request.queries().first() else {
            debug!("Refusing request without questions");
            return DnsOutcome::code(ResponseCode::Refused, ResponseSource::Refused);
        };

        let question_name = question.name().to_ascii();
        let qname = self.preprocess(&question_name);
        debug!(
            question = %question_name,
            preprocessed = %qname,
            record_type = %question.query_type(),
            protocol = %ctx.protocol,
            "Resolving query"
        );

        if let Some(outcome) = self.run_chain(ctx, question, &qname).await {
            return outcome;
        }

        self.recurse(request, ctx, question).await
    }

    async fn run_chain(&self, ctx: &QueryContext, question: &Query, qname: &str) -> Option<DnsOutcome> {
        let chain = self.dispatch(ctx, question, qname);
        match self.resolver_deadline {
            Some(deadline) => match tokio::time::timeout(deadline, chain).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        qname = %qname,
                        deadline_ms = deadline.as_millis() as u64,
                        "Resolver chain deadline elapsed, skipping remaining resolvers"
                    );
                    None
                }
            },
            None => chain.await,
        }
    }

    async fn dispatch(&self, ctx: &QueryContext, question: &Query, qname: &str) -> Option<DnsOutcome> {
        for resolver in &self.resolvers {
            let start = Instant::now();
            if let Some(response) = resolver.serve_dns(ctx, question, qname).await {
                info!(
                    resolver = resolver.name(),
                    qname = %qname,
                    answers = response.answer_count(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "Query answered by resolver"
                );
                return Some(DnsOutcome::new(
                    response,
                    ResponseSource::Resolver(resolver.name()),
                ));
            }
        }
        None
    }

    async fn recurse(&self, request: &Message, ctx: &QueryContext, question: &Query) -> DnsOutcome {
        let Some(forwarder) = &self.forwarder else {
            debug!(question = %question.name(), "No resolver answered and recursion is disabled");
            return DnsOutcome::code(ResponseCode::ServFail, ResponseSource::ServFail);
        };

        match forwarder.forward(request, ctx.protocol).await {
            Ok(response) => DnsOutcome::new(response, ResponseSource::Recursion),
            Err(e) => {
                error!(
                    error = %e,
                    question = %question.name(),
                    client = ?ctx.client,
                    protocol = %ctx.protocol,
                    "All upstream nameservers failed"
                );
                DnsOutcome::code(ResponseCode::ServFail, ResponseSource::ServFail)
            }
        }
    }
}
