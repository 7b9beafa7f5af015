//! Self-hosted admission gate
//!
//! A shield rule for blocked peers and user agents, and a per-IP rate rule
//! backed by a keyed `governor` limiter.

use async_trait::async_trait;
use feed_common::{AdmissionConfig, ConfigError};
use feed_core::{AdmissionDecision, AdmissionError, AdmissionGate, ConnectionRequest, DenyReason};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::collections::HashSet;
use std::net::IpAddr;
use std::num::NonZeroU32;

/// Admission gate evaluated in-process
pub struct LocalAdmissionGate {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    blocked_ips: HashSet<IpAddr>,
    blocked_user_agents: Vec<String>,
}

impl LocalAdmissionGate {
    /// Build the gate from admission settings
    ///
    /// Allows `max` attempts per `window` per peer IP, replenished evenly
    /// across the window.
    pub fn from_config(config: &AdmissionConfig) -> Result<Self, ConfigError> {
        let burst = NonZeroU32::new(config.max)
            .ok_or_else(|| ConfigError::InvalidValue("ADMISSION_MAX", "must be > 0".into()))?;

        let quota = Quota::with_period(config.window() / config.max)
            .ok_or_else(|| {
                ConfigError::InvalidValue("ADMISSION_WINDOW_MS", "must be > 0".into())
            })?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::keyed(quota),
            blocked_ips: config.blocked_ips.iter().copied().collect(),
            blocked_user_agents: config
                .blocked_user_agents
                .iter()
                .map(|agent| agent.to_lowercase())
                .filter(|agent| !agent.is_empty())
                .collect(),
        })
    }

    fn is_blocked_agent(&self, user_agent: Option<&str>) -> bool {
        let Some(user_agent) = user_agent else {
            return false;
        };
        let user_agent = user_agent.to_lowercase();

        self.blocked_user_agents
            .iter()
            .any(|blocked| user_agent.contains(blocked.as_str()))
    }
}

#[async_trait]
impl AdmissionGate for LocalAdmissionGate {
    async fn evaluate(
        &self,
        request: &ConnectionRequest,
    ) -> Result<AdmissionDecision, AdmissionError> {
        let ip = request.ip().ok_or_else(|| {
            AdmissionError::InvalidRequest("peer address unavailable".to_string())
        })?;

        if self.blocked_ips.contains(&ip) || self.is_blocked_agent(request.user_agent.as_deref()) {
            return Ok(AdmissionDecision::Deny(DenyReason::Forbidden));
        }

        if self.limiter.check_key(&ip).is_err() {
            return Ok(AdmissionDecision::Deny(DenyReason::RateLimited));
        }

        // Keep the keyed state from growing with every peer ever seen
        self.limiter.retain_recent();

        Ok(AdmissionDecision::Allow)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

impl std::fmt::Debug for LocalAdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAdmissionGate")
            .field("blocked_ips", &self.blocked_ips.len())
            .field("blocked_user_agents", &self.blocked_user_agents.len())
            .field("tracked_peers", &self.limiter.len())
            .finish()
    }
}
