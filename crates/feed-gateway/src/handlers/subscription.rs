//! Subscribe / unsubscribe handling

use super::RouteOutcome;
use crate::connection::{Connection, ConnectionRegistry};
use crate::protocol::ServerMessage;
use feed_core::MatchId;

/// Handles subscription changes requested by a client
pub struct SubscriptionHandler;

impl SubscriptionHandler {
    /// Add a subscription and acknowledge it
    pub fn subscribe(
        registry: &ConnectionRegistry,
        connection: &Connection,
        match_id: MatchId,
    ) -> RouteOutcome {
        if !registry.subscribe(connection.id(), match_id) {
            return RouteOutcome::Ignored;
        }

        reply(connection, &ServerMessage::Subscribed { match_id });
        RouteOutcome::Subscribed(match_id)
    }

    /// Remove a subscription and acknowledge it, subscribed or not
    pub fn unsubscribe(
        registry: &ConnectionRegistry,
        connection: &Connection,
        match_id: MatchId,
    ) -> RouteOutcome {
        if !registry.unsubscribe(connection.id(), match_id) {
            return RouteOutcome::Ignored;
        }

        reply(connection, &ServerMessage::Unsubscribed { match_id });
        RouteOutcome::Unsubscribed(match_id)
    }
}

pub(super) fn reply(connection: &Connection, message: &ServerMessage) {
    if let Err(e) = connection.send_message(message) {
        tracing::debug!(
            connection_id = %connection.id(),
            kind = message.kind(),
            reason = %e,
            "Reply dropped"
        );
    }
}
