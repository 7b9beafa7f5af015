//! Gateway state
//!
//! Application state for the gateway server.

use crate::admission::AdmissionPolicy;
use crate::broadcast::{Broadcaster, ChannelPublisher, EventDispatcher};
use crate::connection::ConnectionRegistry;
use crate::heartbeat::HeartbeatSweeper;
use feed_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server. Cloning is cheap.
#[derive(Clone)]
pub struct GatewayState {
    /// Live connections and their subscriptions
    registry: Arc<ConnectionRegistry>,
    /// Synchronous fan-out
    broadcaster: Broadcaster,
    /// Admission check run on every upgrade
    admission: AdmissionPolicy,
    /// Drains events published through `ChannelPublisher`
    event_dispatcher: Arc<EventDispatcher>,
    /// Liveness sweeper
    sweeper: Arc<HeartbeatSweeper>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Wire up a gateway around a registry; background tasks are not started
    pub fn new(registry: Arc<ConnectionRegistry>, admission: AdmissionPolicy, config: AppConfig) -> Self {
        let broadcaster = Broadcaster::new(registry.clone());
        let event_dispatcher = Arc::new(EventDispatcher::new(broadcaster.clone()));
        let sweeper = Arc::new(HeartbeatSweeper::new(
            registry.clone(),
            config.websocket.heartbeat_interval(),
        ));

        Self {
            registry,
            broadcaster,
            admission,
            event_dispatcher,
            sweeper,
            config: Arc::new(config),
        }
    }

    /// Start the sweeper and the event dispatcher
    pub fn start_background_tasks(&self) {
        self.sweeper.clone().start();
        self.event_dispatcher.clone().start();
    }

    /// Stop the sweeper and the event dispatcher
    pub fn stop_background_tasks(&self) {
        self.sweeper.stop();
        self.event_dispatcher.stop();
    }

    /// Get the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the broadcaster
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Get a publisher that queues events for the dispatcher
    pub fn publisher(&self) -> ChannelPublisher {
        self.event_dispatcher.publisher()
    }

    /// Get the admission policy
    pub fn admission(&self) -> &AdmissionPolicy {
        &self.admission
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("admission", &self.admission)
            .field("sweeper", &self.sweeper)
            .field("config", &"AppConfig")
            .finish()
    }
}
