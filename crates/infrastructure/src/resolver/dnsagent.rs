use super::options::{parse_route_labels, DnsAgentOptions};
use super::{lookup_instances, ResolverContext, DNSAGENT};
use crate::dns::records::{
    address_record, authoritative_response, decode_addr_label, encode_addr_target,
    instance_address_records, srv_record, to_fqdn,
};
use async_trait::async_trait;
use ferrous_mesh_application::ports::{NamingClient, NamingResolver, QueryContext};
use ferrous_mesh_domain::{
    DomainError, QnameParser, ResolverConfigEntry, ServiceInstance, ServiceKey,
};
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::{Name, Record, RecordType};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Answers A/AAAA/SRV with every instance of a service, and resolves the
/// `_addr` names it hands out as SRV targets.
pub struct DnsAgentResolver {
    naming: Arc<dyn NamingClient>,
    namespace: String,
    system_namespace: String,
    parser: Option<QnameParser>,
    route_labels: HashMap<String, String>,
    timeout: Duration,
    max_a_answers: usize,
    max_srv_answers: usize,
    ttl: u32,
}

impl DnsAgentResolver {
    pub fn new(ctx: &ResolverContext) -> Self {
        Self {
            naming: Arc::clone(&ctx.naming),
            namespace: ctx.namespace.clone(),
            system_namespace: ctx.system_namespace.clone(),
            parser: None,
            route_labels: HashMap::new(),
            timeout: Duration::from_secs(1),
            max_a_answers: 20,
            max_srv_answers: 10,
            ttl: 0,
        }
    }

    fn serve_addr_name(
        &self,
        question: &Query,
        qname: &str,
        decoded: Result<IpAddr, DomainError>,
    ) -> Option<Message> {
        let record_type = question.query_type();
        if record_type == RecordType::SRV {
            return None;
        }

        let ip = match decoded {
            Ok(ip) => ip,
            Err(e) => {
                debug!(qname, error = %e, "Undecodable address label");
                return None;
            }
        };

        let answers = address_record(question.name().clone(), ip, record_type, self.ttl)
            .into_iter()
            .collect();
        Some(authoritative_response(answers))
    }

    fn srv_records(&self, name: &Name, key: &ServiceKey, instances: &[ServiceInstance]) -> Vec<Record> {
        instances
            .iter()
            .filter_map(|instance| {
                let target = match instance.ip() {
                    Some(ip) => encode_addr_target(ip, key),
                    None => Name::from_ascii(to_fqdn(&instance.host))
                        .map_err(|e| DomainError::InvalidDomainName(e.to_string())),
                };
                match target {
                    Ok(target) => Some(srv_record(name.clone(), instance, target, self.ttl)),
                    Err(e) => {
                        debug!(host = %instance.host, error = %e, "Skipping SRV target");
                        None
                    }
                }
            })
            .take(self.max_srv_answers)
            .collect()
    }
}

#[async_trait]
impl NamingResolver for DnsAgentResolver {
    fn name(&self) -> &'static str {
        DNSAGENT
    }

    fn initialize(&mut self, entry: &ResolverConfigEntry) -> Result<(), DomainError> {
        let options: DnsAgentOptions = entry.options()?;
        self.route_labels = parse_route_labels(&options.route_labels);
        self.timeout = options.timeout();
        self.max_a_answers = options.max_a_answers;
        self.max_srv_answers = options.max_srv_answers;
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
        if !matches!(
            record_type,
            RecordType::A | RecordType::AAAA | RecordType::SRV
        ) {
            return None;
        }

        if let Some(decoded) = decode_addr_label(qname) {
            return self.serve_addr_name(question, qname, decoded);
        }

        let key = self.parser.as_ref()?.parse(qname)?;
        let instances = lookup_instances(
            DNSAGENT,
            &self.naming,
            &key,
            &self.route_labels,
            self.timeout,
            false,
        )
        .await;
        if instances.is_empty() {
            debug!(service = %key, "No instances");
            return None;
        }

        let answers = match record_type {
            RecordType::SRV => self.srv_records(question.name(), &key, &instances),
            _ => instance_address_records(
                question.name(),
                &instances,
                record_type,
                self.ttl,
                self.max_a_answers,
            ),
        };

        debug!(
            service = %key,
            record_type = %record_type,
            instances = instances.len(),
            answers = answers.len(),
            "Built answers"
        );
        Some(authoritative_response(answers))
    }
}
