use super::lookup_table::{LookupTable, LookupTableHandle};
use ferrous_mesh_application::ports::ServiceRegistry;
use std::collections::BTreeSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Polls the registry and republishes the lookup table whenever the member
/// set changes.
pub struct LookupTableRefreshJob {
    registry: Arc<dyn ServiceRegistry>,
    table: Arc<LookupTableHandle>,
    interval: Duration,
    ipv4: Vec<Ipv4Addr>,
    ipv6: Vec<Ipv6Addr>,
    ttl: u32,
    shutdown: CancellationToken,
}

impl LookupTableRefreshJob {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        table: Arc<LookupTableHandle>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            table,
            interval,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
            ttl: 0,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_answers(mut self, ipv4: Vec<Ipv4Addr>, ipv6: Vec<Ipv6Addr>) -> Self {
        self.ipv4 = ipv4;
        self.ipv6 = ipv6;
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) {
        info!(
            registry = self.registry.kind(),
            interval_secs = self.interval.as_secs(),
            "Starting lookup table refresh job"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            let mut current = None;
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("LookupTableRefreshJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.refresh(&mut current).await;
                    }
                }
            }
        });
    }

    /// One poll. Publishes a rebuilt table and returns true when the member
    /// set differs from `current`; registry failures keep the old table.
    pub async fn refresh(&self, current: &mut Option<BTreeSet<String>>) -> bool {
        let services = match self.registry.current_services().await {
            Ok(services) => services,
            Err(e) => {
                error!(registry = self.registry.kind(), error = %e, "Failed to fetch services");
                return false;
            }
        };

        if !services_changed(current.as_ref(), &services) {
            debug!(services = services.len(), "Service set unchanged");
            return false;
        }

        let table = LookupTable::build(&services, &self.ipv4, &self.ipv6, self.ttl);
        info!(hosts = table.len(), "Lookup table updated");
        self.table.publish(table);
        *current = Some(services);
        true
    }
}

fn services_changed(current: Option<&BTreeSet<String>>, next: &BTreeSet<String>) -> bool {
    match current {
        None => true,
        Some(current) => current.len() != next.len() || current != next,
    }
}
