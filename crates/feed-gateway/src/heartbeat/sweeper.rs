//! Heartbeat sweeper

use crate::connection::{ConnectionRegistry, OutboundFrame};
use feed_core::ConnectionId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

/// Result of a single sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections sent a fresh probe
    pub probed: usize,
    /// Connections evicted for missing the previous probe
    pub evicted: usize,
}

/// Periodic liveness check over the whole registry
pub struct HeartbeatSweeper {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
    running: AtomicBool,
    shutdown: Notify,
}

impl HeartbeatSweeper {
    /// Create a sweeper; call `start` to begin ticking
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    /// Sweep interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the sweep loop
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Heartbeat sweeper is already running");
            return;
        }

        let sweeper = self.clone();
        tokio::spawn(async move {
            sweeper.run().await;
        });

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Heartbeat sweeper started");
    }

    /// Cancel the sweep loop
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.shutdown.notify_one();
            tracing::info!("Heartbeat sweeper stopped");
        }
    }

    /// Check if the sweep loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick();
                    tracing::trace!(
                        probed = report.probed,
                        evicted = report.evicted,
                        "Heartbeat sweep"
                    );
                }
                _ = self.shutdown.notified() => break,
            }

            if !self.is_running() {
                break;
            }
        }

        tracing::debug!("Heartbeat sweep loop ended");
    }

    /// Run one sweep
    ///
    /// Connections that have not answered since the last sweep are removed
    /// from the registry and terminated; every other connection is marked
    /// unanswered and sent a ping.
    pub fn tick(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let mut inner = self.registry.write();

        let mut dead: Vec<ConnectionId> = Vec::new();
        for connection in inner.connections() {
            if connection.swap_alive(false) {
                if connection.try_send(OutboundFrame::Ping).is_err() {
                    // A closed or backed-up queue still gets one more sweep
                    tracing::trace!(connection_id = %connection.id(), "Probe not queued");
                }
                report.probed += 1;
            } else {
                dead.push(connection.id());
            }
        }

        for id in dead {
            if let Some(connection) = inner.remove(id) {
                tracing::warn!(
                    connection_id = %id,
                    remote_addr = ?connection.remote_addr(),
                    "Connection missed heartbeat, terminating"
                );
                connection.terminate();
                report.evicted += 1;
            }
        }

        report
    }
}

impl Drop for HeartbeatSweeper {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for HeartbeatSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeartbeatSweeper")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}
