//! Event dispatcher
//!
//! Receives events published from outside the gateway's tasks and hands them
//! to the broadcaster on a single background task.

use super::Broadcaster;
use feed_core::{EventPublisher, FeedEvent, PublishError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// Events that may wait for the dispatcher before publishers see `Full`
pub const DEFAULT_PUBLISH_CAPACITY: usize = 1024;

/// Publisher handle that queues events for the dispatcher
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<FeedEvent>,
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, event: FeedEvent) -> Result<(), PublishError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PublishError::Full,
            mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
        })
    }
}

/// Event dispatcher that drains published events into the broadcaster
pub struct EventDispatcher {
    /// Broadcaster for fan-out
    broadcaster: Broadcaster,
    /// Publisher side of the queue, handed out to callers
    sender: mpsc::Sender<FeedEvent>,
    /// Taken by the loop on start
    receiver: Mutex<Option<mpsc::Receiver<FeedEvent>>>,
    /// Whether the dispatcher is running
    running: AtomicBool,
    /// Wakes the loop on stop
    shutdown: Notify,
    /// Events dispatched so far
    dispatched: AtomicU64,
}

impl EventDispatcher {
    /// Create a new event dispatcher with the default queue depth
    pub fn new(broadcaster: Broadcaster) -> Self {
        Self::with_capacity(broadcaster, DEFAULT_PUBLISH_CAPACITY)
    }

    /// Create a new event dispatcher whose queue holds at most `capacity` events
    pub fn with_capacity(broadcaster: Broadcaster, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        Self {
            broadcaster,
            sender,
            receiver: Mutex::new(Some(receiver)),
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
            dispatched: AtomicU64::new(0),
        }
    }

    /// A publisher feeding this dispatcher
    pub fn publisher(&self) -> ChannelPublisher {
        ChannelPublisher {
            sender: self.sender.clone(),
        }
    }

    /// Start the event dispatcher
    ///
    /// Spawns a background task that receives published events and fans
    /// them out. The queue can only be drained once, so a stopped
    /// dispatcher cannot be restarted.
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event dispatcher is already running");
            return;
        }

        let Some(receiver) = self.receiver.lock().take() else {
            self.running.store(false, Ordering::SeqCst);
            tracing::warn!("Event dispatcher cannot be restarted");
            return;
        };

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.run(receiver).await;
        });

        tracing::info!("Event dispatcher started");
    }

    /// Stop the event dispatcher
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.shutdown.notify_one();
            tracing::info!("Event dispatcher stopped");
        }
    }

    /// Run the event dispatcher loop
    async fn run(&self, mut receiver: mpsc::Receiver<FeedEvent>) {
        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        tracing::warn!("Event dispatcher channel closed");
                        break;
                    }
                },
                _ = self.shutdown.notified() => break,
            }

            if !self.is_running() {
                break;
            }
        }

        // Publishers now see `Closed`
        receiver.close();
        self.running.store(false, Ordering::SeqCst);
        tracing::info!(
            dispatched = self.dispatched.load(Ordering::Relaxed),
            "Event dispatcher loop ended"
        );
    }

    fn handle_event(&self, event: FeedEvent) {
        let name = event.name();
        let topic = event.topic();

        let report = self.broadcaster.dispatch(event);
        self.dispatched.fetch_add(1, Ordering::Relaxed);

        tracing::trace!(
            event = name,
            match_id = ?topic,
            delivered = report.delivered,
            skipped = report.skipped,
            "Event dispatched"
        );
    }

    /// Check if the dispatcher is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of events dispatched since start
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("running", &self.is_running())
            .field("dispatched", &self.dispatched())
            .finish()
    }
}
