//! Feed events - what the persistence layer hands to the live feed
//!
//! Payloads are opaque records. The feed forwards them to clients as the
//! `data` field of the matching server message without looking inside.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;
use crate::value_objects::MatchId;

/// An event published into the live feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEvent {
    /// A new match was created; visible to every connection
    MatchCreated { data: Value },
    /// A commentary entry was added to a match; visible to its subscribers
    Commentary { match_id: MatchId, data: Value },
}

impl FeedEvent {
    /// Build a match-created event from any serializable record
    pub fn match_created<T: Serialize>(record: &T) -> Result<Self, DomainError> {
        let data = serde_json::to_value(record).map_err(|e| DomainError::InvalidEvent(e.to_string()))?;
        Ok(Self::MatchCreated { data })
    }

    /// Build a commentary event from any serializable record
    pub fn commentary<T: Serialize>(match_id: MatchId, record: &T) -> Result<Self, DomainError> {
        let data = serde_json::to_value(record).map_err(|e| DomainError::InvalidEvent(e.to_string()))?;
        Ok(Self::Commentary { match_id, data })
    }

    /// The topic this event is scoped to, or `None` for global events
    pub fn topic(&self) -> Option<MatchId> {
        match self {
            Self::MatchCreated { .. } => None,
            Self::Commentary { match_id, .. } => Some(*match_id),
        }
    }

    /// Event name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::MatchCreated { .. } => "match_created",
            Self::Commentary { .. } => "commentary",
        }
    }
}
