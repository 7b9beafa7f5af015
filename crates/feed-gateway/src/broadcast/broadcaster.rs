//! Broadcaster
//!
//! Encodes each event once and queues the shared frame on every target's
//! outbound channel. Delivery is best-effort and never reported back.

use crate::connection::{ConnectionRegistry, DeliveryReport, OutboundFrame};
use crate::protocol::ServerMessage;
use feed_core::{EventPublisher, FeedEvent, MatchId, PublishError};
use serde::Serialize;
use std::sync::Arc;

/// Fan-out over the connection registry
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over a registry
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Announce a new match to every connection
    pub fn broadcast_match_created<T: Serialize>(&self, record: &T) -> DeliveryReport {
        match FeedEvent::match_created(record) {
            Ok(event) => self.dispatch(event),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode match record");
                DeliveryReport::default()
            }
        }
    }

    /// Send commentary to a match's subscribers
    pub fn broadcast_commentary<T: Serialize>(&self, match_id: MatchId, record: &T) -> DeliveryReport {
        match FeedEvent::commentary(match_id, record) {
            Ok(event) => self.dispatch(event),
            Err(e) => {
                tracing::error!(match_id = %match_id, error = %e, "Failed to encode commentary record");
                DeliveryReport::default()
            }
        }
    }

    /// Route an event: topic events to subscribers, everything else to all
    pub fn dispatch(&self, event: FeedEvent) -> DeliveryReport {
        let topic = event.topic();
        let message = ServerMessage::from(event);

        match topic {
            Some(match_id) => self.broadcast_topic(match_id, &message),
            None => self.broadcast_all(&message),
        }
    }

    /// Queue a message for every registered connection
    pub fn broadcast_all(&self, message: &ServerMessage) -> DeliveryReport {
        let Some(frame) = encode(message) else {
            return DeliveryReport::default();
        };

        let report = self.registry.send_to_all(&frame);
        tracing::debug!(
            kind = message.kind(),
            delivered = report.delivered,
            skipped = report.skipped,
            "Broadcast to all"
        );

        report
    }

    /// Queue a message for a match's current subscribers
    pub fn broadcast_topic(&self, match_id: MatchId, message: &ServerMessage) -> DeliveryReport {
        let Some(frame) = encode(message) else {
            return DeliveryReport::default();
        };

        let report = self.registry.send_to_topic(match_id, &frame);
        tracing::trace!(
            match_id = %match_id,
            kind = message.kind(),
            delivered = report.delivered,
            skipped = report.skipped,
            "Broadcast to match"
        );

        report
    }
}

fn encode(message: &ServerMessage) -> Option<OutboundFrame> {
    match OutboundFrame::message(message) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!(kind = message.kind(), error = %e, "Failed to encode broadcast");
            None
        }
    }
}

impl EventPublisher for Broadcaster {
    fn publish(&self, event: FeedEvent) -> Result<(), PublishError> {
        self.dispatch(event);
        Ok(())
    }
}
