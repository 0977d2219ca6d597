/*!
# Actuatorbeat DevKit - test tooling

Helpers for testing pollers without a real actuator or broker:
- Recording sink that captures published events (and can fail on demand)
- Actuator payload fixtures (`/metrics`, `/health`)
- Harness bundling a mock actuator HTTP server with a recording sink
*/

// `ActuatorFixtures::metrics_full` is a single large json! literal
#![recursion_limit = "512"]

pub mod fixtures;
pub mod mock_sink;
pub mod test_utils;

pub use fixtures::{ActuatorFixtures, RawMetricsBuilder};
pub use mock_sink::RecordingSink;
pub use test_utils::TestHarness;
