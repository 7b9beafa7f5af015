//! Inbound message handlers
//!
//! Routes decoded client frames to the subscription index and queues the
//! acknowledgements on the connection's outbound channel.

mod error;
mod heartbeat;
mod subscription;

pub use error::RouteError;
pub use heartbeat::HeartbeatHandler;
pub use subscription::SubscriptionHandler;

use crate::connection::{Connection, ConnectionRegistry};
use crate::protocol::ClientMessage;
use feed_core::MatchId;

/// What the router did with a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Subscription added (or already present) and acknowledged
    Subscribed(MatchId),
    /// Subscription removed (or never present) and acknowledged
    Unsubscribed(MatchId),
    /// Frame could not be parsed; an error notification was queued
    Rejected,
    /// Frame was dropped without a reply
    Ignored,
}

/// Dispatch incoming client frames to the appropriate handler
pub struct MessageRouter;

impl MessageRouter {
    /// Handle a text frame
    pub fn route(
        registry: &ConnectionRegistry,
        connection: &Connection,
        text: &str,
    ) -> RouteOutcome {
        let message = match ClientMessage::decode(text).map_err(RouteError::from) {
            Ok(message) => message,
            Err(err) => return Self::reject(connection, &err),
        };

        let outcome = match message {
            ClientMessage::Subscribe { match_id } => {
                SubscriptionHandler::subscribe(registry, connection, match_id)
            }
            ClientMessage::Unsubscribe { match_id } => {
                SubscriptionHandler::unsubscribe(registry, connection, match_id)
            }
        };

        tracing::debug!(
            connection_id = %connection.id(),
            outcome = ?outcome,
            "Message routed"
        );

        outcome
    }

    /// Handle a binary frame by decoding it as UTF-8 text
    pub fn route_binary(
        registry: &ConnectionRegistry,
        connection: &Connection,
        bytes: &[u8],
    ) -> RouteOutcome {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::route(registry, connection, text),
            Err(_) => Self::reject(connection, &RouteError::InvalidJson),
        }
    }

    fn reject(connection: &Connection, err: &RouteError) -> RouteOutcome {
        match err.to_reply() {
            Some(reply) => {
                tracing::debug!(connection_id = %connection.id(), "Rejected malformed frame");
                subscription::reply(connection, &reply);
                RouteOutcome::Rejected
            }
            None => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    error = %err,
                    "Dropped unrecognized message"
                );
                RouteOutcome::Ignored
            }
        }
    }
}
