//! Gateway protocol definitions
//!
//! Defines the JSON message formats exchanged over `/ws` and the close codes.

mod close_codes;
mod messages;

pub use close_codes::CloseCode;
pub use messages::{ClientMessage, DecodeError, ServerMessage, INVALID_JSON_MESSAGE};
