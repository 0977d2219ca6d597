//! Actuatorbeat - Spring Boot actuator poller
//!
//! Polls `/metrics` and `/health` on every configured actuator at a fixed
//! period and publishes one event per successful fetch:
//! - Independent scheduler per target (`scheduler`, `fleet`)
//! - Flat-to-nested metrics rewrite (`metrics`)
//! - Health documents forwarded as-is (`health`)
//! - MQTT or console output (`publisher`)

pub mod client;
pub mod config;
pub mod event;
pub mod fleet;
pub mod health;
pub mod metrics;
pub mod publisher;
pub mod scheduler;

pub use client::{EndpointClient, FetchError, StatsKind};
pub use config::{ConfigError, PollConfig, Settings, Target};
pub use event::{BeatInfo, EventPayload, PollEvent};
pub use fleet::Fleet;
pub use health::HealthDocument;
pub use metrics::{normalize, NormalizedMetrics, RawMetricsDocument};
pub use publisher::{EventSink, PublishError};
pub use scheduler::{SchedulerState, TargetPoller, TargetScheduler, TickReport};
