//! Mesh proxy resolver: answers for every registry member with fixed proxy
//! addresses, from a table refreshed in the background.

pub mod lookup_table;
pub mod options;
pub mod refresh;

pub use lookup_table::{LookupTable, LookupTableHandle};
pub use options::{MeshProxyOptions, RegistryKind};
pub use refresh::LookupTableRefreshJob;

use super::{ResolverContext, MESHPROXY};
use crate::dns::records::authoritative_response;
use crate::naming::{EnvoyRegistry, NamingServiceRegistry};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use ferrous_mesh_application::ports::{
    DebugHandler, NamingClient, NamingResolver, QueryContext, ServiceRegistry,
};
use ferrous_mesh_domain::{match_suffix, DomainError, ResolverConfigEntry};
use hickory_proto::op::{Message, Query};
use lookup_table::normalize_host;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const LOOKUP_TABLE_DEBUG_PATH: &str = "/debug/meshproxy/lookup_table";

pub struct MeshProxyResolver {
    naming: Arc<dyn NamingClient>,
    namespace: String,
    suffix: String,
    ttl: u32,
    options: Option<MeshProxyOptions>,
    registry: Option<Arc<dyn ServiceRegistry>>,
    table: Arc<LookupTableHandle>,
    refresh_token: ArcSwapOption<CancellationToken>,
}

impl MeshProxyResolver {
    pub fn new(ctx: &ResolverContext) -> Self {
        Self {
            naming: Arc::clone(&ctx.naming),
            namespace: ctx.namespace.clone(),
            suffix: ".".to_string(),
            ttl: 0,
            options: None,
            registry: None,
            table: Arc::new(LookupTableHandle::new()),
            refresh_token: ArcSwapOption::empty(),
        }
    }

    /// Uses `registry` instead of the one named in the options.
    pub fn with_registry(mut self, registry: Arc<dyn ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn lookup_table(&self) -> Arc<LookupTableHandle> {
        Arc::clone(&self.table)
    }

    fn build_registry(
        &self,
        options: &MeshProxyOptions,
    ) -> Result<Arc<dyn ServiceRegistry>, DomainError> {
        Ok(match options.registry {
            RegistryKind::Naming => Arc::new(NamingServiceRegistry::new(
                Arc::clone(&self.naming),
                options.business().map(str::to_string),
            )),
            RegistryKind::Envoy => Arc::new(EnvoyRegistry::new(
                &options.registry_host,
                options.registry_port,
            )?),
        })
    }
}

#[async_trait]
impl NamingResolver for MeshProxyResolver {
    fn name(&self) -> &'static str {
        MESHPROXY
    }

    fn initialize(&mut self, entry: &ResolverConfigEntry) -> Result<(), DomainError> {
        let options: MeshProxyOptions = entry.options()?;
        if options.dns_answer_ip.is_none() && options.dns_answer_ip6.is_none() {
            return Err(DomainError::InvalidResolverOption(
                "meshproxy needs dns_answer_ip or dns_answer_ip6".to_string(),
            ));
        }

        if self.registry.is_none() {
            self.registry = Some(self.build_registry(&options)?);
        }
        self.suffix = entry.fqdn_suffix();
        self.ttl = entry.dns_ttl;
        self.options = Some(options);
        Ok(())
    }

    fn start(&self, shutdown: CancellationToken) {
        let (Some(options), Some(registry)) = (&self.options, &self.registry) else {
            return;
        };

        let token = shutdown.child_token();
        let job = LookupTableRefreshJob::new(
            Arc::clone(registry),
            Arc::clone(&self.table),
            options.reload_interval(),
        )
        .with_answers(options.answer_ipv4(), options.answer_ipv6())
        .with_ttl(self.ttl)
        .with_cancellation(token.clone());

        if let Some(previous) = self.refresh_token.swap(Some(Arc::new(token))) {
            previous.cancel();
        }
        Arc::new(job).start();
    }

    fn destroy(&self) {
        if let Some(token) = self.refresh_token.swap(None) {
            token.cancel();
        }
    }

    async fn serve_dns(&self, _ctx: &QueryContext, question: &Query, qname: &str) -> Option<Message> {
        let (trimmed, matched) = match_suffix(qname, &self.suffix);
        if !matched {
            return None;
        }
        let table = self.table.load()?;

        let hostname = normalize_host(trimmed);
        let record_type = question.query_type();
        let answers = table
            .lookup(question.name(), &hostname, record_type)
            .or_else(|| {
                let qualified = normalize_host(&format!("{}{}", hostname, self.namespace));
                table.lookup(question.name(), &qualified, record_type)
            })?;

        debug!(
            hostname = %hostname,
            record_type = %record_type,
            answers = answers.len(),
            "Mesh name resolved"
        );
        Some(authoritative_response(answers))
    }

    fn debug_handlers(&self) -> Vec<DebugHandler> {
        let table = Arc::clone(&self.table);
        vec![DebugHandler::new(
            LOOKUP_TABLE_DEBUG_PATH,
            Arc::new(move || {
                table
                    .load()
                    .and_then(|table| serde_json::to_value(table.as_ref()).ok())
                    .unwrap_or(serde_json::Value::Null)
            }),
        )]
    }
}
