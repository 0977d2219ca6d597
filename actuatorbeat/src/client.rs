//! Actuator HTTP client
//!
//! One GET per stats kind against one target. A response only counts when the
//! status is exactly 200 and the body decodes as the expected JSON shape.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::config::Target;
use crate::health::HealthDocument;
use crate::metrics::RawMetricsDocument;

pub const METRICS_PATH: &str = "/metrics";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsKind {
    Metrics,
    Health,
}

impl StatsKind {
    pub fn path(self) -> &'static str {
        match self {
            StatsKind::Metrics => METRICS_PATH,
            StatsKind::Health => HEALTH_PATH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatsKind::Metrics => "metrics",
            StatsKind::Health => "health",
        }
    }
}

impl fmt::Display for StatsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("Invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Decoded body of one stats endpoint
#[derive(Debug, Clone)]
pub enum Document {
    Metrics(RawMetricsDocument),
    Health(HealthDocument),
}

#[derive(Debug, Clone, Default)]
pub struct EndpointClient {
    http: reqwest::Client,
}

impl EndpointClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing reqwest client (connection pool, proxy settings)
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn fetch(&self, target: &Target, kind: StatsKind) -> Result<Document, FetchError> {
        match kind {
            StatsKind::Metrics => self.fetch_metrics(target).await.map(Document::Metrics),
            StatsKind::Health => self.fetch_health(target).await.map(Document::Health),
        }
    }

    pub async fn fetch_metrics(&self, target: &Target) -> Result<RawMetricsDocument, FetchError> {
        self.get_json(target, StatsKind::Metrics).await
    }

    pub async fn fetch_health(&self, target: &Target) -> Result<HealthDocument, FetchError> {
        self.get_json(target, StatsKind::Health).await
    }

    async fn get_json<T: DeserializeOwned>(&self, target: &Target, kind: StatsKind) -> Result<T, FetchError> {
        let url = target.endpoint(kind.path());
        debug!(url = %url, "GET actuator stats");

        let transport = |source| FetchError::Transport { url: url.clone(), source };

        let response = self.http.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn target_for(server: &MockServer) -> Target {
        Target::parse(&format!("{}/", server.uri())).unwrap()
    }

    #[test]
    fn test_kind_paths() {
        assert_eq!(StatsKind::Metrics.path(), "/metrics");
        assert_eq!(StatsKind::Health.path(), "/health");
        assert_eq!(StatsKind::Health.to_string(), "health");
    }

    #[tokio::test]
    async fn test_fetch_metrics_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mem": 1024, "mem.free": 512})))
            .mount(&server)
            .await;

        let client = EndpointClient::new();
        let raw = client.fetch_metrics(&target_for(&server).await).await.unwrap();
        assert_eq!(raw.get("mem.free"), Some(&json!(512)));
    }

    #[tokio::test]
    async fn test_fetch_health_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "UP"})))
            .mount(&server)
            .await;

        let doc = EndpointClient::new()
            .fetch(&target_for(&server).await, StatsKind::Health)
            .await
            .unwrap();
        match doc {
            Document::Health(health) => assert!(health.is_up()),
            other => panic!("unexpected document {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_200_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"status": "DOWN"})))
            .mount(&server)
            .await;

        let err = EndpointClient::new()
            .fetch_health(&target_for(&server).await)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus(503)));
    }

    #[tokio::test]
    async fn test_204_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = EndpointClient::new()
            .fetch_metrics(&target_for(&server).await)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus(204)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = EndpointClient::new()
            .fetch_metrics(&target_for(&server).await)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_non_object_metrics_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .mount(&server)
            .await;

        let err = EndpointClient::new()
            .fetch_metrics(&target_for(&server).await)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is not served in the test environment
        let target = Target::parse("http://127.0.0.1:9").unwrap();
        let err = EndpointClient::new().fetch_metrics(&target).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
