use super::options::{parse_route_labels, DiscoveryOptions};
use super::{lookup_instances, ResolverContext, DISCOVERY};
use crate::dns::records::{authoritative_response, instance_address_records};
use async_trait::async_trait;
use ferrous_mesh_application::ports::{NamingClient, NamingResolver, QueryContext};
use ferrous_mesh_domain::{DomainError, QnameParser, ResolverConfigEntry};
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::RecordType;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Answers A/AAAA with the one instance the naming backend picks.
pub struct DiscoveryResolver {
    naming: Arc<dyn NamingClient>,
    namespace: String,
    system_namespace: String,
    parser: Option<QnameParser>,
    route_labels: HashMap<String, String>,
    timeout: Duration,
    ttl: u32,
}

impl DiscoveryResolver {
    pub fn new(ctx: &ResolverContext) -> Self {
        Self {
            naming: Arc::clone(&ctx.naming),
            namespace: ctx.namespace.clone(),
            system_namespace: ctx.system_namespace.clone(),
            parser: None,
            route_labels: HashMap::new(),
            timeout: Duration::from_secs(1),
            ttl: 0,
        }
    }
}

#[async_trait]
impl NamingResolver for DiscoveryResolver {
    fn name(&self) -> &'static str {
        DISCOVERY
    }

    fn initialize(&mut self, entry: &ResolverConfigEntry) -> Result<(), DomainError> {
        let options: DiscoveryOptions = entry.options()?;
        self.route_labels = parse_route_labels(&options.route_labels);
        self.timeout = options.timeout();
        self.ttl = entry.dns_ttl;
        self.parser = Some(QnameParser::new(
            &entry.fqdn_suffix(),
            &self.namespace,
            &self.system_namespace,
        ));
        Ok(())
    }

    async fn serve_dns(&self, _ctx: &QueryContext, question: &Query, qname: &str) -> Option<Message> {
        let record_type = question.query_type();
        if !matches!(record_type, RecordType::A | RecordType::AAAA) {
            return None;
        }

        let key = self.parser.as_ref()?.parse(qname)?;

        let instances = lookup_instances(
            DISCOVERY,
            &self.naming,
            &key,
            &self.route_labels,
            self.timeout,
            true,
        )
        .await;

        let answers = instance_address_records(question.name(), &instances, record_type, self.ttl, 1);
        if answers.is_empty() {
            debug!(service = %key, record_type = %record_type, "No usable instance");
            return None;
        }

        Some(authoritative_response(answers))
    }
}
