use super::{DiscoveryResolver, DnsAgentResolver, MeshProxyResolver};
use super::{DISCOVERY, DNSAGENT, MESHPROXY};
use ferrous_mesh_application::ports::{NamingClient, NamingResolver};
use ferrous_mesh_domain::{DomainError, ResolverConfigEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Shared inputs every resolver is constructed from.
#[derive(Clone)]
pub struct ResolverContext {
    pub naming: Arc<dyn NamingClient>,
    /// Namespace of the workload this sidecar runs beside.
    pub namespace: String,
    pub system_namespace: String,
}

pub type ResolverFactory = Arc<dyn Fn(&ResolverContext) -> Box<dyn NamingResolver> + Send + Sync>;

pub fn factory<R>(build: fn(&ResolverContext) -> R) -> ResolverFactory
where
    R: NamingResolver + 'static,
{
    Arc::new(move |ctx: &ResolverContext| -> Box<dyn NamingResolver> { Box::new(build(ctx)) })
}

/// Resolver constructors keyed by the name used in `[[resolvers]]`.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    factories: HashMap<String, ResolverFactory>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with discovery, dnsagent and meshproxy.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(DISCOVERY, factory(DiscoveryResolver::new));
        registry.register(DNSAGENT, factory(DnsAgentResolver::new));
        registry.register(MESHPROXY, factory(MeshProxyResolver::new));
        registry
    }

    pub fn register(&mut self, name: &str, factory: ResolverFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds and initializes the enabled entries, in file order.
    ///
    /// On the first failure every resolver initialized so far is destroyed,
    /// last first, and the error is returned.
    pub fn build_chain(
        &self,
        entries: &[ResolverConfigEntry],
        ctx: &ResolverContext,
    ) -> Result<Vec<Arc<dyn NamingResolver>>, DomainError> {
        let mut chain: Vec<Box<dyn NamingResolver>> = Vec::new();

        for entry in entries.iter().filter(|entry| entry.enable) {
            match self.build_one(entry, ctx) {
                Ok(resolver) => {
                    info!(
                        resolver = %entry.name,
                        suffix = %entry.suffix,
                        dns_ttl = entry.dns_ttl,
                        "Resolver initialized"
                    );
                    chain.push(resolver);
                }
                Err(e) => {
                    error!(resolver = %entry.name, error = %e, "Resolver failed to initialize");
                    for resolver in chain.iter().rev() {
                        resolver.destroy();
                    }
                    return Err(e);
                }
            }
        }

        Ok(chain.into_iter().map(Arc::from).collect())
    }

    fn build_one(
        &self,
        entry: &ResolverConfigEntry,
        ctx: &ResolverContext,
    ) -> Result<Box<dyn NamingResolver>, DomainError> {
        let factory = self
            .factories
            .get(&entry.name)
            .ok_or_else(|| DomainError::UnknownResolver(entry.name.clone()))?;

        let mut resolver = factory(ctx);
        resolver
            .initialize(entry)
            .map_err(|e| DomainError::ResolverInit(entry.name.clone(), e.to_string()))?;
        Ok(resolver)
    }
}
