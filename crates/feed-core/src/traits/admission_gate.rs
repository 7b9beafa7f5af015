//! Admission gate port
//!
//! The gateway consults a gate once per connection attempt, before the
//! connection is registered. Implementations may call out to a remote
//! service; the gateway awaits the answer without a timeout of its own.

use async_trait::async_trait;

use crate::admission::{AdmissionDecision, AdmissionError, ConnectionRequest};

#[async_trait]
pub trait AdmissionGate: Send + Sync {
    /// Decide whether a connection attempt may proceed
    ///
    /// `Err` means the gate could not decide; callers must treat it as a refusal.
    async fn evaluate(&self, request: &ConnectionRequest) -> Result<AdmissionDecision, AdmissionError>;

    /// Short name for logs
    fn name(&self) -> &'static str {
        "admission-gate"
    }
}

/// Gate that admits everyone
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllGate;

#[async_trait]
impl AdmissionGate for AllowAllGate {
    async fn evaluate(&self, _request: &ConnectionRequest) -> Result<AdmissionDecision, AdmissionError> {
        Ok(AdmissionDecision::Allow)
    }

    fn name(&self) -> &'static str {
        "allow-all"
    }
}
