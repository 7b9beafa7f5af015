//! Admission policy
//!
//! Wraps a gate with the enforcement mode and maps its verdict onto the
//! close code sent to a refused peer.

use crate::protocol::CloseCode;
use feed_common::{AdmissionConfig, ConfigError};
use feed_core::{
    AdmissionDecision, AdmissionGate, AdmissionMode, AllowAllGate, ConnectionRequest, DenyReason,
};
use std::sync::Arc;

use super::LocalAdmissionGate;

/// Gate plus enforcement mode, consulted once per upgrade
#[derive(Clone)]
pub struct AdmissionPolicy {
    gate: Arc<dyn AdmissionGate>,
    mode: AdmissionMode,
}

impl AdmissionPolicy {
    /// Create a policy around any gate
    pub fn new(gate: Arc<dyn AdmissionGate>, mode: AdmissionMode) -> Self {
        Self { gate, mode }
    }

    /// A policy that admits everyone
    pub fn allow_all() -> Self {
        Self::new(Arc::new(AllowAllGate), AdmissionMode::Live)
    }

    /// Build the policy described by the admission settings
    ///
    /// A disabled gate admits everyone; otherwise the local gate is used.
    pub fn from_config(config: &AdmissionConfig) -> Result<Self, ConfigError> {
        if !config.enabled {
            return Ok(Self::allow_all());
        }

        let gate = LocalAdmissionGate::from_config(config)?;
        Ok(Self::new(Arc::new(gate), config.mode))
    }

    /// The gate's name, for logging
    pub fn gate_name(&self) -> &'static str {
        self.gate.name()
    }

    /// Enforcement mode
    pub fn mode(&self) -> AdmissionMode {
        self.mode
    }

    /// Decide whether a connection attempt may proceed
    ///
    /// `Err` carries the close code to send before dropping the transport.
    /// Gate failures always refuse the connection, even in dry-run mode.
    pub async fn check(&self, request: &ConnectionRequest) -> Result<(), CloseCode> {
        let reason = match self.gate.evaluate(request).await {
            Ok(AdmissionDecision::Allow) => return Ok(()),
            Ok(AdmissionDecision::Deny(reason)) => reason,
            Err(e) => {
                tracing::error!(
                    gate = self.gate.name(),
                    remote_addr = ?request.remote_addr,
                    error = %e,
                    "Admission check failed"
                );
                return Err(CloseCode::InternalError);
            }
        };

        if !self.mode.is_enforcing() {
            tracing::warn!(
                gate = self.gate.name(),
                remote_addr = ?request.remote_addr,
                reason = %reason,
                "Admission denied (dry run), admitting"
            );
            return Ok(());
        }

        tracing::debug!(
            gate = self.gate.name(),
            remote_addr = ?request.remote_addr,
            reason = %reason,
            "Admission denied"
        );

        Err(close_code_for(reason))
    }
}

fn close_code_for(reason: DenyReason) -> CloseCode {
    match reason {
        DenyReason::RateLimited => CloseCode::TryAgainLater,
        DenyReason::Forbidden => CloseCode::PolicyViolation,
    }
}

impl std::fmt::Debug for AdmissionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionPolicy")
            .field("gate", &self.gate.name())
            .field("mode", &self.mode)
            .finish()
    }
}
