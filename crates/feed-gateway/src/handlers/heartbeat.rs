//! Liveness responses

use crate::connection::{Connection, ConnectionRegistry};

/// Handles pong frames answering the sweeper's probes
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    /// Record that the peer answered
    pub fn handle_pong(registry: &ConnectionRegistry, connection: &Connection) {
        if registry.mark_alive(connection.id()) {
            tracing::trace!(connection_id = %connection.id(), "Pong received");
        } else {
            // Evicted between the probe and the answer
            tracing::trace!(
                connection_id = %connection.id(),
                "Pong from unregistered connection"
            );
        }
    }
}
