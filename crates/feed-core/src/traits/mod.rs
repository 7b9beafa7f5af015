//! Ports - the interfaces the feed needs from its collaborators

mod admission_gate;
mod publisher;

pub use admission_gate::{AdmissionGate, AllowAllGate};
pub use publisher::{EventPublisher, PublishError};
