use async_trait::async_trait;
use ferrous_mesh_application::ports::{NamingClient, ServiceRegistry};
use ferrous_mesh_domain::{DomainError, ServiceInstance, ServiceKey};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct MockNamingClient {
    instances: HashMap<String, Vec<ServiceInstance>>,
    failing: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen_labels: Mutex<Vec<HashMap<String, String>>>,
}

impl MockNamingClient {
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
            failing: false,
            delay: None,
            calls: AtomicUsize::new(0),
            seen_labels: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn with_service(mut self, namespace: &str, service: &str, instances: Vec<ServiceInstance>) -> Self {
        self.instances
            .insert(ServiceKey::new(namespace, service).to_string(), instances);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_labels(&self) -> Vec<HashMap<String, String>> {
        self.seen_labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl NamingClient for MockNamingClient {
    async fn get_instances(
        &self,
        key: &ServiceKey,
        route_labels: &HashMap<String, String>,
    ) -> Result<Vec<ServiceInstance>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_labels.lock().unwrap().push(route_labels.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(DomainError::NamingBackend("backend down".to_string()));
        }
        Ok(self
            .instances
            .get(&key.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn get_services(&self, _business: Option<&str>) -> Result<BTreeSet<String>, DomainError> {
        if self.failing {
            return Err(DomainError::NamingBackend("backend down".to_string()));
        }
        Ok(self.instances.keys().cloned().collect())
    }
}

/// Registry whose member set tests replace at will.
pub struct MockServiceRegistry {
    services: Mutex<Result<BTreeSet<String>, String>>,
    polls: AtomicUsize,
}

impl MockServiceRegistry {
    pub fn new(services: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            services: Mutex::new(Ok(services.iter().map(|s| s.to_string()).collect())),
            polls: AtomicUsize::new(0),
        })
    }

    pub fn set_services(&self, services: &[&str]) {
        *self.services.lock().unwrap() = Ok(services.iter().map(|s| s.to_string()).collect());
    }

    pub fn set_failing(&self) {
        *self.services.lock().unwrap() = Err("registry down".to_string());
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceRegistry for MockServiceRegistry {
    fn kind(&self) -> &'static str {
        "mock"
    }

    async fn current_services(&self) -> Result<BTreeSet<String>, DomainError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.services
            .lock()
            .unwrap()
            .clone()
            .map_err(DomainError::RegistryUnavailable)
    }
}
