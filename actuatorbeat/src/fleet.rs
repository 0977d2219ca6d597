//! Fleet of target schedulers
//!
//! One scheduler task per configured target, all sharing the same
//! [`PollConfig`], HTTP client and sink, and all observing one cancellation
//! token. Failures never cross target boundaries.

use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::client::EndpointClient;
use crate::config::{PollConfig, Target};
use crate::event::BeatInfo;
use crate::publisher::EventSink;
use crate::scheduler::{SchedulerState, TargetPoller, TargetScheduler};

#[derive(Clone)]
pub struct Fleet {
    cancel: CancellationToken,
    tracker: TaskTracker,
    schedulers: Arc<Vec<(Target, watch::Receiver<SchedulerState>)>>,
}

impl Fleet {
    /// Spawn one scheduler per target; must be called inside a tokio runtime
    pub fn start(
        targets: Vec<Target>,
        config: PollConfig,
        client: EndpointClient,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self::start_with_beat(targets, config, client, sink, Arc::new(BeatInfo::detect()))
    }

    pub fn start_with_beat(
        targets: Vec<Target>,
        config: PollConfig,
        client: EndpointClient,
        sink: Arc<dyn EventSink>,
        beat: Arc<BeatInfo>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let mut schedulers = Vec::with_capacity(targets.len());

        info!(
            targets = targets.len(),
            period_ms = config.period.as_millis() as u64,
            metrics = config.poll_metrics,
            health = config.poll_health,
            "Starting actuator pollers"
        );

        for target in targets {
            let poller =
                TargetPoller::new(target.clone(), config, client.clone(), sink.clone(), beat.clone());
            let scheduler = TargetScheduler::new(poller);
            schedulers.push((target, scheduler.state()));
            tracker.spawn(scheduler.run(cancel.clone()));
        }
        // Every scheduler is spawned; `wait` can now resolve once they finish
        tracker.close();

        Self {
            cancel,
            tracker,
            schedulers: Arc::new(schedulers),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.schedulers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.schedulers.len()
    }

    /// Shared cancellation signal, for hosts that need to hook other shutdown work
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current state of every scheduler, in configuration order
    pub fn states(&self) -> Vec<(Target, SchedulerState)> {
        self.schedulers
            .iter()
            .map(|(target, state)| (target.clone(), *state.borrow()))
            .collect()
    }

    /// Block until `stop` is called and every scheduler has stopped.
    /// Returns immediately for an empty fleet.
    pub async fn run(&self) {
        if self.is_empty() {
            info!("No actuator targets configured, nothing to poll");
            return;
        }
        self.cancel.cancelled().await;
        self.tracker.wait().await;
    }

    /// Stop the fleet once `signal` resolves. When `signal` cannot be
    /// installed, `fallback` is awaited instead; when neither can, the fleet
    /// is left running and must be stopped some other way.
    pub async fn stop_on_signal<S, F>(&self, signal: S, fallback: F)
    where
        S: Future<Output = io::Result<()>>,
        F: Future<Output = io::Result<()>>,
    {
        if let Err(e) = signal.await {
            error!("❌ Failed to listen for shutdown signal: {}", e);
            if let Err(e) = fallback.await {
                error!("❌ Fallback shutdown signal unavailable: {}", e);
                return;
            }
        }
        info!("Shutdown signal received");
        self.stop().await;
    }

    /// Fire the cancellation signal (once) and wait for every scheduler to drain
    pub async fn stop(&self) {
        if self.cancel.is_cancelled() {
            debug!("Stop already requested");
        } else {
            info!(targets = self.len(), "Stopping actuator pollers");
            self.cancel.cancel();
        }
        self.tracker.wait().await;
        debug!("All pollers stopped");
    }
}
