//! # feed-core
//!
//! Domain layer for the live match feed: topic and connection identifiers,
//! feed events, admission types, and the ports the gateway is wired through.
//! This crate has no dependency on the web framework or the runtime.

pub mod admission;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use admission::{AdmissionDecision, AdmissionError, AdmissionMode, ConnectionRequest, DenyReason};
pub use error::DomainError;
pub use events::FeedEvent;
pub use traits::{AdmissionGate, AllowAllGate, EventPublisher, PublishError};
pub use value_objects::{ConnectionId, MatchId};
