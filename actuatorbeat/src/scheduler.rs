//! Per-target polling loop
//!
//! A [`TargetScheduler`] owns one target and one periodic timer:
//! - every tick polls `/metrics` then `/health` (each when enabled)
//! - a failed fetch or publish skips that kind for the tick, nothing more
//! - ticks that take longer than the period are reported, the timer then
//!   drops the ticks it missed instead of queuing them
//! - on cancellation no new tick starts; a tick already in flight finishes
//!
//! Lifecycle: `Idle -> Running -> Draining -> Stopped`, observable through
//! [`TargetScheduler::state`].

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::client::{Document, EndpointClient, FetchError, StatsKind};
use crate::config::{PollConfig, Target};
use crate::event::{BeatInfo, EventPayload, PollEvent};
use crate::metrics::normalize;
use crate::publisher::{EventSink, PublishError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub emitted: u32,
    pub failed: u32,
    pub duration: Duration,
    pub overrun: bool,
}

/// Fetch -> normalize -> emit for one target
pub struct TargetPoller {
    target: Target,
    config: PollConfig,
    client: EndpointClient,
    sink: Arc<dyn EventSink>,
    beat: Arc<BeatInfo>,
    next_counter: u64,
}

impl TargetPoller {
    pub fn new(
        target: Target,
        config: PollConfig,
        client: EndpointClient,
        sink: Arc<dyn EventSink>,
        beat: Arc<BeatInfo>,
    ) -> Self {
        Self {
            target,
            config,
            client,
            sink,
            beat,
            next_counter: 1,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Number of events successfully handed to the sink so far
    pub fn emitted(&self) -> u64 {
        self.next_counter - 1
    }

    /// Run one tick: every enabled kind is attempted, failures are logged
    pub async fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let mut report = TickReport::default();

        for kind in self.config.enabled_kinds() {
            match self.poll(kind).await {
                Ok(()) => report.emitted += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(kind = %kind, "❌ Error reading {} stats: {}", kind, e);
                }
            }
        }

        report.duration = started.elapsed();
        if report.duration > self.config.period {
            report.overrun = true;
            warn!(
                elapsed_ms = report.duration.as_millis() as u64,
                period_ms = self.config.period.as_millis() as u64,
                "⚠️ Ignoring tick(s) due to processing taking longer than one period"
            );
        }
        report
    }

    async fn poll(&mut self, kind: StatsKind) -> Result<(), PollError> {
        debug!(kind = %kind, "Polling {} stats", kind);

        let payload = match self.client.fetch(&self.target, kind).await? {
            Document::Metrics(raw) => EventPayload::Metrics(normalize(&raw)),
            Document::Health(health) => EventPayload::Health(health),
        };

        let counter = self.next_counter;
        let event = PollEvent::new(&self.target, counter, payload, &self.beat);
        self.sink.publish(&event).await?;
        self.next_counter += 1;

        info!(kind = %kind, counter, "Actuator {} stats sent", kind);
        Ok(())
    }
}

/// Timer loop around a [`TargetPoller`]
pub struct TargetScheduler {
    poller: TargetPoller,
    state: watch::Sender<SchedulerState>,
}

impl TargetScheduler {
    pub fn new(poller: TargetPoller) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self { poller, state }
    }

    pub fn target(&self) -> &Target {
        self.poller.target()
    }

    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Poll until `cancel` fires; returns the number of events emitted
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let span = info_span!("target", url = %self.poller.target);
        async move {
            let period = self.poller.config.period;
            self.set_state(SchedulerState::Running);
            info!(period_ms = period.as_millis() as u64, "Poller started");

            // First tick one full period after start
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        self.set_state(SchedulerState::Draining);
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let tick = self.poller.tick();
                tokio::pin!(tick);
                tokio::select! {
                    _ = &mut tick => {}
                    _ = cancel.cancelled() => {
                        self.state.send_replace(SchedulerState::Draining);
                        debug!("Stop requested, finishing in-flight tick");
                        tick.await;
                        break;
                    }
                }
            }

            self.set_state(SchedulerState::Stopped);
            let emitted = self.poller.emitted();
            info!(events = emitted, "Poller stopped");
            emitted
        }
        .instrument(span)
        .await
    }

    fn set_state(&self, state: SchedulerState) {
        debug!(?state, "Scheduler state change");
        self.state.send_replace(state);
    }
}
