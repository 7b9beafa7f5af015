//! Event publisher port
//!
//! The persistence layer announces new matches and commentary through this
//! trait after a successful write. Publishing is fire-and-forget: delivery
//! failures to individual clients are never reported back.

use serde::Serialize;
use thiserror::Error;

use crate::events::FeedEvent;
use crate::value_objects::MatchId;

/// Errors a publisher can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The feed is shut down and no longer accepts events
    #[error("Event feed is closed")]
    Closed,

    /// The dispatcher is behind and its queue is full; the event was dropped
    #[error("Event feed is backed up")]
    Full,

    /// The record could not be encoded as JSON
    #[error("Event record could not be encoded: {0}")]
    Encode(String),
}

pub trait EventPublisher: Send + Sync {
    /// Hand an event to the feed
    fn publish(&self, event: FeedEvent) -> Result<(), PublishError>;

    /// Announce a newly created match to every connection
    fn publish_match_created<T: Serialize>(&self, record: &T) -> Result<(), PublishError>
    where
        Self: Sized,
    {
        let event = FeedEvent::match_created(record).map_err(|e| PublishError::Encode(e.to_string()))?;
        self.publish(event)
    }

    /// Announce a commentary entry to the match's subscribers
    fn publish_commentary<T: Serialize>(&self, match_id: MatchId, record: &T) -> Result<(), PublishError>
    where
        Self: Sized,
    {
        let event =
            FeedEvent::commentary(match_id, record).map_err(|e| PublishError::Encode(e.to_string()))?;
        self.publish(event)
    }
}
