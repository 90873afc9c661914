use async_trait::async_trait;
use ferrous_mesh_application::ports::ServiceRegistry;
use ferrous_mesh_domain::DomainError;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

const ENVOY_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct ClusterConfigDump {
    #[serde(default)]
    configs: Vec<ClusterConfig>,
}

#[derive(Debug, Deserialize)]
struct ClusterConfig {
    cluster: Option<Cluster>,
}

#[derive(Debug, Deserialize)]
struct Cluster {
    name: String,
}

/// Mesh members read from the active clusters of a local Envoy admin API.
pub struct EnvoyRegistry {
    url: String,
    http_client: reqwest::Client,
}

impl EnvoyRegistry {
    pub fn new(host: &str, port: u16) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .user_agent("ferrous-mesh/0.1 (envoy-registry)")
            .timeout(ENVOY_TIMEOUT)
            .build()
            .map_err(|e| DomainError::ResolverInit("meshproxy".to_string(), e.to_string()))?;

        Ok(Self {
            url: format!(
                "http://{}:{}/config_dump?resource=dynamic_active_clusters",
                host, port
            ),
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub(crate) fn parse_cluster_names(body: &[u8]) -> Result<BTreeSet<String>, DomainError> {
    let dump: ClusterConfigDump = serde_json::from_slice(body)
        .map_err(|e| DomainError::RegistryUnavailable(format!("bad envoy config dump: {}", e)))?;

    Ok(dump
        .configs
        .into_iter()
        .filter_map(|config| config.cluster)
        .map(|cluster| cluster.name)
        .filter(|name| !name.is_empty())
        .collect())
}

#[async_trait]
impl ServiceRegistry for EnvoyRegistry {
    fn kind(&self) -> &'static str {
        "envoy"
    }

    async fn current_services(&self) -> Result<BTreeSet<String>, DomainError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DomainError::RegistryUnavailable(format!("{}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(DomainError::RegistryUnavailable(format!(
                "HTTP {} for {}",
                response.status().as_u16(),
                self.url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::RegistryUnavailable(format!("{}: {}", self.url, e)))?;

        let services = parse_cluster_names(&body)?;
        debug!(clusters = services.len(), "Envoy clusters fetched");
        Ok(services)
    }
}
