#![allow(dead_code)]

use async_trait::async_trait;
use ferrous_mesh_application::ports::{NamingResolver, QueryContext, UpstreamForwarder};
use ferrous_mesh_domain::{DomainError, ResolverConfigEntry, TransportProtocol};
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn query_message(name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(4242)
        .set_message_type(MessageType::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(Name::from_str(name).unwrap(), record_type));
    message
}

#[derive(Clone)]
pub struct MockNamingResolver {
    name: &'static str,
    answers: Arc<Mutex<HashMap<String, Ipv4Addr>>>,
    seen: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockNamingResolver {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            answers: Arc::new(Mutex::new(HashMap::new())),
            seen: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn with_answer(self, qname: &str, ip: &str) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(qname.to_string(), ip.parse().unwrap());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_names(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl NamingResolver for MockNamingResolver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn initialize(&mut self, _entry: &ResolverConfigEntry) -> Result<(), DomainError> {
        Ok(())
    }

    async fn serve_dns(
        &self,
        _ctx: &QueryContext,
        question: &Query,
        qname: &str,
    ) -> Option<Message> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(qname.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let ip = *self.answers.lock().unwrap().get(qname)?;
        let mut response = Message::new();
        response
            .set_authoritative(true)
            .set_response_code(ResponseCode::NoError)
            .add_answer(Record::from_rdata(
                question.name().clone(),
                10,
                RData::A(A(ip)),
            ));
        Some(response)
    }
}

#[derive(Clone)]
pub struct MockUpstreamForwarder {
    response_code: Option<ResponseCode>,
    calls: Arc<AtomicUsize>,
    protocols: Arc<Mutex<Vec<TransportProtocol>>>,
}

impl MockUpstreamForwarder {
    /// Forwarder answering every request with `code`.
    pub fn answering(code: ResponseCode) -> Self {
        Self {
            response_code: Some(code),
            calls: Arc::new(AtomicUsize::new(0)),
            protocols: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Forwarder whose upstreams are all unreachable.
    pub fn failing() -> Self {
        Self {
            response_code: None,
            calls: Arc::new(AtomicUsize::new(0)),
            protocols: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn protocols(&self) -> Vec<TransportProtocol> {
        self.protocols.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamForwarder for MockUpstreamForwarder {
    async fn forward(
        &self,
        request: &Message,
        protocol: TransportProtocol,
    ) -> Result<Message, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.protocols.lock().unwrap().push(protocol);

        let code = self
            .response_code
            .ok_or(DomainError::TransportAllServersUnreachable)?;
        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_response_code(code)
            .add_queries(request.queries().to_vec());
        Ok(response)
    }
}
