use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::StatsKind;
use crate::config::Target;
use crate::health::HealthDocument;
use crate::metrics::NormalizedMetrics;

pub const BEAT_NAME: &str = "actuatorbeat";

/// Identity of the process emitting events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeatInfo {
    pub name: String,
    pub hostname: String,
    pub version: String,
}

impl BeatInfo {
    pub fn detect() -> Self {
        Self {
            name: BEAT_NAME.to_string(),
            hostname: gethostname::gethostname().to_string_lossy().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One published record (matches the `{prefix}/{type}@v1` topics)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollEvent {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: StatsKind,
    /// Per-target sequence, shared by metrics and health, starts at 1
    pub counter: u64,
    pub beat: BeatInfo,
    #[serde(flatten)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPayload {
    Metrics(NormalizedMetrics),
    Health(HealthDocument),
}

impl EventPayload {
    pub fn kind(&self) -> StatsKind {
        match self {
            EventPayload::Metrics(_) => StatsKind::Metrics,
            EventPayload::Health(_) => StatsKind::Health,
        }
    }
}

impl PollEvent {
    pub fn new(target: &Target, counter: u64, payload: EventPayload, beat: &BeatInfo) -> Self {
        Self {
            timestamp: Utc::now(),
            target: target.identity().to_string(),
            kind: payload.kind(),
            counter,
            beat: beat.clone(),
            payload,
        }
    }

    pub fn metrics(&self) -> Option<&NormalizedMetrics> {
        match &self.payload {
            EventPayload::Metrics(m) => Some(m),
            EventPayload::Health(_) => None,
        }
    }

    pub fn health(&self) -> Option<&HealthDocument> {
        match &self.payload {
            EventPayload::Health(h) => Some(h),
            EventPayload::Metrics(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn beat() -> BeatInfo {
        BeatInfo {
            name: BEAT_NAME.to_string(),
            hostname: "test-host".to_string(),
            version: "0.1.0".to_string(),
        }
    }

    #[test]
    fn test_metrics_event_shape() {
        let target = Target::parse("http://h1/").unwrap();
        let event = PollEvent::new(&target, 3, EventPayload::Metrics(NormalizedMetrics::default()), &beat());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "metrics");
        assert_eq!(json["target"], "http://h1");
        assert_eq!(json["counter"], 3);
        assert_eq!(json["beat"]["hostname"], "test-host");
        assert_eq!(json["metrics"]["heap"]["used"], 0);
        assert!(json.get("health").is_none());
        assert!(json["@timestamp"].as_str().is_some());
    }

    #[test]
    fn test_health_event_shape() {
        let target = Target::parse("http://h1").unwrap();
        let health: HealthDocument = serde_json::from_value(json!({"status": "UP"})).unwrap();
        let event = PollEvent::new(&target, 1, EventPayload::Health(health), &beat());

        assert_eq!(event.kind, StatsKind::Health);
        assert!(event.metrics().is_none());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "health");
        assert_eq!(json["health"], json!({"status": "UP"}));
    }

    #[test]
    fn test_detect_beat() {
        let beat = BeatInfo::detect();
        assert_eq!(beat.name, "actuatorbeat");
        assert!(!beat.version.is_empty());
    }
}
