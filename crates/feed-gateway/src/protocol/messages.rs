//! Gateway message format
//!
//! Every frame is a JSON object discriminated by its `type` field.

use feed_core::{FeedEvent, MatchId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Text of the error notification sent for unparseable frames
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON";

/// Client-to-server messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving commentary for a match
    Subscribe {
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
    /// Stop receiving commentary for a match
    Unsubscribe {
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
}

/// Why an inbound frame could not be turned into a `ClientMessage`
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not valid JSON at all
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Valid JSON, but not a message this gateway understands
    #[error("Unrecognized message: {0}")]
    Unrecognized(String),
}

impl ClientMessage {
    /// Decode a text frame
    ///
    /// Parsing happens in two steps so that malformed JSON and well-formed
    /// but unknown messages can be told apart.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text).map_err(DecodeError::InvalidJson)?;
        Self::deserialize(value).map_err(|e| DecodeError::Unrecognized(e.to_string()))
    }
}

/// Server-to-client messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the connection is admitted and registered
    Welcome,
    /// Acknowledges a subscribe
    Subscribed {
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
    /// Acknowledges an unsubscribe
    Unsubscribed {
        #[serde(rename = "matchId")]
        match_id: MatchId,
    },
    /// Malformed inbound frame
    Error { message: String },
    /// A match was created (global)
    MatchCreated { data: Value },
    /// Commentary for a subscribed match
    Commentary { data: Value },
}

impl ServerMessage {
    /// Error notification for a frame that was not valid JSON
    #[must_use]
    pub fn invalid_json() -> Self {
        Self::Error {
            message: INVALID_JSON_MESSAGE.to_string(),
        }
    }

    /// Wire name of this message
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
            Self::Error { .. } => "error",
            Self::MatchCreated { .. } => "match_created",
            Self::Commentary { .. } => "commentary",
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<FeedEvent> for ServerMessage {
    fn from(event: FeedEvent) -> Self {
        match event {
            FeedEvent::MatchCreated { data } => Self::MatchCreated { data },
            FeedEvent::Commentary { data, .. } => Self::Commentary { data },
        }
    }
}

impl std::fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscribed { match_id } | Self::Unsubscribed { match_id } => {
                write!(f, "ServerMessage({}, matchId={match_id})", self.kind())
            }
            _ => write!(f, "ServerMessage({})", self.kind()),
        }
    }
}
