//! Connection management
//!
//! The registry of live connections and the subscription index.

mod connection;
mod registry;

pub use connection::{Connection, OutboundFrame, SendError};
pub use registry::{ConnectionRegistry, DeliveryReport};
