//! Admission types shared between the gateway and gate implementations

mod decision;
mod request;

pub use decision::{AdmissionDecision, AdmissionError, AdmissionMode, DenyReason};
pub use request::ConnectionRequest;
