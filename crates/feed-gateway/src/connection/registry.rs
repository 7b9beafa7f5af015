//! Connection registry and subscription index
//!
//! One lock guards both the set of live connections and the two views of
//! the subscription relation (match -> connections, connection -> matches),
//! so registration, subscription changes, sweeps and fan-out never observe
//! each other half-done. Nothing awaits while the lock is held.

use super::{Connection, OutboundFrame};
use feed_core::{ConnectionId, MatchId};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of a fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Frames queued
    pub delivered: usize,
    /// Targets whose queue was closed or full
    pub skipped: usize,
}

impl DeliveryReport {
    /// Number of connections the fan-out targeted
    pub fn targeted(&self) -> usize {
        self.delivered + self.skipped
    }
}

struct ConnectionEntry {
    connection: Arc<Connection>,
    topics: HashSet<MatchId>,
}

/// State guarded by the registry lock
#[derive(Default)]
pub(crate) struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    topics: HashMap<MatchId, HashSet<ConnectionId>>,
}

impl RegistryInner {
    /// Iterate over every registered connection
    pub(crate) fn connections(&self) -> impl Iterator<Item = &Arc<Connection>> {
        self.connections.values().map(|entry| &entry.connection)
    }

    /// Drop a connection and every subscription it holds
    pub(crate) fn remove(&mut self, id: ConnectionId) -> Option<Arc<Connection>> {
        let entry = self.connections.remove(&id)?;

        for topic in &entry.topics {
            self.detach(*topic, id);
        }

        Some(entry.connection)
    }

    /// Remove `id` from a topic's subscriber set, dropping the set once empty
    fn detach(&mut self, topic: MatchId, id: ConnectionId) {
        if let Some(subscribers) = self.topics.get_mut(&topic) {
            subscribers.remove(&id);
            if subscribers.is_empty() {
                self.topics.remove(&topic);
            }
        }
    }
}

/// Registry of all live connections and their subscriptions
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    /// Create a new, empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection with no subscriptions, marked alive
    pub fn register(
        &self,
        sender: mpsc::Sender<OutboundFrame>,
        remote_addr: Option<SocketAddr>,
    ) -> Arc<Connection> {
        let connection = Connection::new(sender, remote_addr);

        self.inner.write().connections.insert(
            connection.id(),
            ConnectionEntry {
                connection: connection.clone(),
                topics: HashSet::new(),
            },
        );

        tracing::debug!(connection_id = %connection.id(), "Connection registered");

        connection
    }

    /// Remove a connection from every topic, then drop its record
    ///
    /// Returns `false` if the connection was not registered. Safe to call twice.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.inner.write().remove(id);

        if let Some(connection) = &removed {
            tracing::debug!(
                connection_id = %id,
                lifetime_ms = (chrono::Utc::now() - connection.connected_at()).num_milliseconds(),
                "Connection unregistered"
            );
        }

        removed.is_some()
    }

    /// Subscribe a connection to a match
    ///
    /// Idempotent. Returns `false` only if the connection is not registered.
    pub fn subscribe(&self, id: ConnectionId, topic: MatchId) -> bool {
        let mut inner = self.inner.write();

        let Some(entry) = inner.connections.get_mut(&id) else {
            return false;
        };

        if entry.topics.insert(topic) {
            inner.topics.entry(topic).or_default().insert(id);
            tracing::trace!(connection_id = %id, match_id = %topic, "Subscribed to match");
        }

        true
    }

    /// Unsubscribe a connection from a match
    ///
    /// A no-op if it was never subscribed. Returns `false` only if the
    /// connection is not registered.
    pub fn unsubscribe(&self, id: ConnectionId, topic: MatchId) -> bool {
        let mut inner = self.inner.write();

        let Some(entry) = inner.connections.get_mut(&id) else {
            return false;
        };

        if entry.topics.remove(&topic) {
            inner.detach(topic, id);
            tracing::trace!(connection_id = %id, match_id = %topic, "Unsubscribed from match");
        }

        true
    }

    /// Record a liveness response
    pub fn mark_alive(&self, id: ConnectionId) -> bool {
        let inner = self.inner.read();

        match inner.connections.get(&id) {
            Some(entry) => {
                entry.connection.swap_alive(true);
                true
            }
            None => false,
        }
    }

    /// Queue a frame for every registered connection
    pub fn send_to_all(&self, frame: &OutboundFrame) -> DeliveryReport {
        let inner = self.inner.read();
        deliver(inner.connections(), frame)
    }

    /// Queue a frame for every subscriber of a match
    pub fn send_to_topic(&self, topic: MatchId, frame: &OutboundFrame) -> DeliveryReport {
        let inner = self.inner.read();

        let Some(subscribers) = inner.topics.get(&topic) else {
            return DeliveryReport::default();
        };

        let targets = subscribers
            .iter()
            .filter_map(|id| inner.connections.get(id).map(|entry| &entry.connection));

        deliver(targets, frame)
    }

    /// Exclusive access for the heartbeat sweep
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write()
    }

    /// Get a connection by ID
    pub fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.inner
            .read()
            .connections
            .get(&id)
            .map(|entry| entry.connection.clone())
    }

    /// Check if a connection is registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.read().connections.contains_key(&id)
    }

    /// Matches a connection is subscribed to
    pub fn subscriptions(&self, id: ConnectionId) -> Vec<MatchId> {
        self.inner
            .read()
            .connections
            .get(&id)
            .map(|entry| entry.topics.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Connections subscribed to a match
    pub fn subscribers(&self, topic: MatchId) -> Vec<ConnectionId> {
        self.inner
            .read()
            .topics
            .get(&topic)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of connections subscribed to a match
    pub fn subscriber_count(&self, topic: MatchId) -> usize {
        self.inner.read().topics.get(&topic).map_or(0, HashSet::len)
    }

    /// Get the total number of registered connections
    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }

    /// Get the number of matches with at least one subscriber
    pub fn topic_count(&self) -> usize {
        self.inner.read().topics.len()
    }
}

fn deliver<'a>(
    targets: impl Iterator<Item = &'a Arc<Connection>>,
    frame: &OutboundFrame,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    for connection in targets {
        match connection.try_send(frame.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                tracing::trace!(
                    connection_id = %connection.id(),
                    reason = %e,
                    "Skipping connection"
                );
                report.skipped += 1;
            }
        }
    }

    report
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ConnectionRegistry")
            .field("connections", &inner.connections.len())
            .field("topics", &inner.topics.len())
            .finish()
    }
}
