/*!
Test harness for actuator pollers

Bundles:
- A mock actuator (wiremock) serving `/metrics` and `/health`
- A [`RecordingSink`] receiving the published events
- Assertions on the JSON of the recorded events
*/

use crate::mock_sink::RecordingSink;
use actuatorbeat::{BeatInfo, EndpointClient, PollConfig, StatsKind, Target, TargetPoller};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestHarness {
    pub server: MockServer,
    pub sink: RecordingSink,
}

impl TestHarness {
    /// Start a mock actuator with nothing mounted (every path answers 404)
    pub async fn start() -> Self {
        init_tracing();
        Self {
            server: MockServer::start().await,
            sink: RecordingSink::new(),
        }
    }

    /// Base address of the mock actuator
    pub fn target(&self) -> Target {
        // MockServer::uri is always a valid http URL
        Target::parse(&self.server.uri()).unwrap_or_else(|e| panic!("mock server uri: {}", e))
    }

    /// Poller wired to the mock actuator and the recording sink
    pub fn poller(&self, config: PollConfig) -> TargetPoller {
        TargetPoller::new(
            self.target(),
            config,
            EndpointClient::new(),
            Arc::new(self.sink.clone()),
            Arc::new(BeatInfo::detect()),
        )
    }

    pub async fn serve(&self, kind: StatsKind, body: Value) {
        self.respond(kind, ResponseTemplate::new(200).set_body_json(body)).await;
    }

    pub async fn serve_delayed(&self, kind: StatsKind, body: Value, delay: Duration) {
        self.respond(kind, ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .await;
    }

    pub async fn fail_with(&self, kind: StatsKind, status: u16) {
        self.respond(kind, ResponseTemplate::new(status)).await;
    }

    pub async fn respond(&self, kind: StatsKind, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(kind.path()))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// Drop every mounted response
    pub async fn reset(&self) {
        self.server.reset().await;
        self.sink.clear();
    }

    /// Number of requests the mock actuator received for one kind
    pub async fn requests_for(&self, kind: StatsKind) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == kind.path())
            .count()
    }

    /// Assert a field of the last recorded event of `kind`; `path` is dotted
    pub fn assert_field_equals(&self, kind: StatsKind, path: &str, expected: &Value) -> Result<()> {
        let Some(event) = self.sink.last_json(kind) else {
            anyhow::bail!("No {} event recorded", kind);
        };
        match get_nested_field(&event, path) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => anyhow::bail!(
                "Field '{}' mismatch: expected {:?}, got {:?}",
                path,
                expected,
                actual
            ),
            None => anyhow::bail!("Field '{}' not found in last {} event", path, kind),
        }
    }

    pub fn assert_field_absent(&self, kind: StatsKind, path: &str) -> Result<()> {
        let Some(event) = self.sink.last_json(kind) else {
            anyhow::bail!("No {} event recorded", kind);
        };
        if let Some(actual) = get_nested_field(&event, path) {
            anyhow::bail!("Field '{}' unexpectedly present: {:?}", path, actual);
        }
        Ok(())
    }
}

/// Walk a JSON value along a dotted path (`metrics.gc.markSweep.count`)
pub fn get_nested_field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, part| match current {
        Value::Object(obj) => obj.get(part),
        _ => None,
    })
}

/// Install a test-friendly tracing subscriber (once per process)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("actuatorbeat=debug")),
        )
        .with_test_writer()
        .try_init();
}
