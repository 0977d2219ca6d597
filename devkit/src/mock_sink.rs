/*!
Recording sink for tests

Stands in for the MQTT publisher: every published event is kept in memory so
tests can assert on counters, kinds and payloads. Publishing can be made to
fail for the next N events to exercise the error path.
*/

use actuatorbeat::{EventSink, PollEvent, PublishError, StatsKind};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<PollEvent>>>,
    failures_pending: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` publish calls fail
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<PollEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn events_of_kind(&self, kind: StatsKind) -> Vec<PollEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn events_for_target(&self, target: &str) -> Vec<PollEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.target == target)
            .cloned()
            .collect()
    }

    /// Counters for one target, in publish order
    pub fn counters_for(&self, target: &str) -> Vec<u64> {
        self.events_for_target(target).iter().map(|e| e.counter).collect()
    }

    /// Last event of a kind, as the JSON a real sink would receive
    pub fn last_json(&self, kind: StatsKind) -> Option<Value> {
        self.events_of_kind(kind)
            .last()
            .and_then(|e| serde_json::to_value(e).ok())
    }

    /// Poll until at least `count` events were recorded or `timeout` expires
    pub async fn wait_for_events(&self, count: usize, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if self.len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.len() >= count
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, event: &PollEvent) -> Result<(), PublishError> {
        let should_fail = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            tracing::debug!(counter = event.counter, "[mock] simulated publish failure");
            return Err(PublishError::Io(std::io::Error::other("simulated publish failure")));
        }

        tracing::debug!(kind = %event.kind, counter = event.counter, "[mock] published");
        self.events.lock().push(event.clone());
        Ok(())
    }
}
