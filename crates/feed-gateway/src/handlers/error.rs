//! Handler error types

use crate::protocol::{DecodeError, ServerMessage};
use thiserror::Error;

/// Why an inbound frame was not acted on
#[derive(Debug, Error)]
pub enum RouteError {
    /// Frame was not JSON (or not UTF-8)
    #[error("Invalid JSON")]
    InvalidJson,

    /// Well-formed JSON that is not a known message
    #[error("Unrecognized message: {0}")]
    Unrecognized(String),
}

impl RouteError {
    /// Reply owed to the client, if any
    ///
    /// Unrecognized messages are dropped without a reply.
    pub fn to_reply(&self) -> Option<ServerMessage> {
        match self {
            Self::InvalidJson => Some(ServerMessage::invalid_json()),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<DecodeError> for RouteError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidJson(_) => Self::InvalidJson,
            DecodeError::Unrecognized(reason) => Self::Unrecognized(reason),
        }
    }
}
