//! Admission decisions and failures

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a connection attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Too many attempts from this peer
    RateLimited,
    /// Peer is blocked by policy (shield or bot rules)
    Forbidden,
}

impl DenyReason {
    /// Human-readable reason, also used as the close frame reason text
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limit exceeded",
            Self::Forbidden => "Forbidden",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allow,
    Deny(DenyReason),
}

impl AdmissionDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Whether deny decisions are enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionMode {
    /// Deny decisions close the connection
    #[default]
    Live,
    /// Deny decisions are logged, the connection is admitted anyway
    DryRun,
}

impl AdmissionMode {
    /// Parse from a config string (`live`, `dry_run`, `DRY_RUN`, `dry-run`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "live" => Some(Self::Live),
            "dry_run" => Some(Self::DryRun),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_enforcing(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// The gate could not reach a decision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Admission service unavailable: {0}")]
    Unavailable(String),

    #[error("Connection request cannot be evaluated: {0}")]
    InvalidRequest(String),
}
