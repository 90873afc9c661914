//! Polaris naming server client over its HTTP discover API.

use super::filter_by_labels;
use async_trait::async_trait;
use ferrous_mesh_application::ports::NamingClient;
use ferrous_mesh_domain::{DomainError, ServiceInstance, ServiceKey};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

const DISCOVER_PATH: &str = "/v1/Discover";

#[derive(Debug, Serialize)]
struct DiscoverRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    service: DiscoverService<'a>,
}

#[derive(Debug, Serialize)]
struct DiscoverService<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    business: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    #[serde(default)]
    instances: Vec<PolarisInstance>,
    #[serde(default)]
    services: Vec<PolarisService>,
}

#[derive(Debug, Deserialize)]
struct PolarisInstance {
    host: String,
    port: u16,
    #[serde(default)]
    priority: u16,
    #[serde(default = "default_weight")]
    weight: u16,
    #[serde(default = "default_healthy")]
    healthy: bool,
    #[serde(default)]
    isolate: bool,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PolarisService {
    name: String,
    namespace: String,
}

fn default_weight() -> u16 {
    100
}

fn default_healthy() -> bool {
    true
}

pub struct PolarisNamingClient {
    endpoints: Vec<String>,
    http_client: reqwest::Client,
}

impl PolarisNamingClient {
    pub fn new(addresses: Vec<String>, timeout: Duration) -> Result<Self, DomainError> {
        if addresses.is_empty() {
            return Err(DomainError::NamingBackend(
                "polaris backend needs at least one address".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .user_agent("ferrous-mesh/0.1 (naming)")
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::NamingBackend(e.to_string()))?;

        let endpoints = addresses
            .iter()
            .map(|address| {
                let base = if address.starts_with("http://") || address.starts_with("https://") {
                    address.trim_end_matches('/').to_string()
                } else {
                    format!("http://{}", address)
                };
                format!("{}{}", base, DISCOVER_PATH)
            })
            .collect();

        Ok(Self {
            endpoints,
            http_client,
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Sends `request` to each endpoint in turn until one answers.
    async fn discover(&self, request: &DiscoverRequest<'_>) -> Result<DiscoverResponse, DomainError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| DomainError::NamingBackend(format!("encode discover request: {}", e)))?;

        let mut last_error = None;
        for endpoint in &self.endpoints {
            match self.post(endpoint, body.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Polaris endpoint failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DomainError::NamingBackend("no polaris endpoints".to_string())))
    }

    async fn post(&self, endpoint: &str, body: Vec<u8>) -> Result<DiscoverResponse, DomainError> {
        let response = self
            .http_client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| DomainError::NamingBackend(format!("{}: {}", endpoint, e)))?;

        if !response.status().is_success() {
            return Err(DomainError::NamingBackend(format!(
                "HTTP {} for {}",
                response.status().as_u16(),
                endpoint
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::NamingBackend(format!("{}: {}", endpoint, e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::NamingBackend(format!("bad discover response: {}", e)))
    }
}

#[async_trait]
impl NamingClient for PolarisNamingClient {
    async fn get_instances(
        &self,
        key: &ServiceKey,
        route_labels: &HashMap<String, String>,
    ) -> Result<Vec<ServiceInstance>, DomainError> {
        let request = DiscoverRequest {
            kind: "INSTANCE",
            service: DiscoverService {
                name: Some(&key.service),
                namespace: Some(&key.namespace),
                business: None,
            },
        };
        let response = self.discover(&request).await?;

        let instances: Vec<ServiceInstance> = response
            .instances
            .into_iter()
            .filter(|instance| instance.healthy && !instance.isolate)
            .map(|instance| ServiceInstance {
                host: instance.host,
                port: instance.port,
                priority: instance.priority,
                weight: instance.weight,
                metadata: instance.metadata,
            })
            .collect();

        debug!(service = %key, instances = instances.len(), "Polaris instances fetched");
        Ok(filter_by_labels(instances, route_labels))
    }

    async fn get_services(&self, business: Option<&str>) -> Result<BTreeSet<String>, DomainError> {
        let request = DiscoverRequest {
            kind: "SERVICES",
            service: DiscoverService {
                name: None,
                namespace: None,
                business,
            },
        };
        let response = self.discover(&request).await?;

        Ok(response
            .services
            .into_iter()
            .map(|svc| ServiceKey::new(svc.namespace, svc.name).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_get_scheme_and_path() {
        let client = PolarisNamingClient::new(
            vec!["127.0.0.1:8090".to_string(), "http://polaris:8090/".to_string()],
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(
            client.endpoints(),
            &[
                "http://127.0.0.1:8090/v1/Discover".to_string(),
                "http://polaris:8090/v1/Discover".to_string(),
            ]
        );
    }

    #[test]
    fn test_requires_an_address() {
        assert!(PolarisNamingClient::new(Vec::new(), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = DiscoverRequest {
            kind: "INSTANCE",
            service: DiscoverService {
                name: Some("svc1"),
                namespace: Some("ns1"),
                business: None,
            },
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"type": "INSTANCE", "service": {"name": "svc1", "namespace": "ns1"}})
        );
    }
}
