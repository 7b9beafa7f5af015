//! Test fixtures
//!
//! Configurations, admission gates and event records reused across tests.

use async_trait::async_trait;
use feed_common::AppConfig;
use feed_core::{AdmissionDecision, AdmissionError, AdmissionGate, ConnectionRequest, DenyReason};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

/// Counter for unique match ids
static MATCH_COUNTER: AtomicI64 = AtomicI64::new(1);

/// Get a match id no other test uses
pub fn unique_match_id() -> i64 {
    MATCH_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Default config with admission switched off
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.admission.enabled = false;
    config
}

/// Test config with a short heartbeat interval
pub fn fast_heartbeat_config(interval_ms: u64) -> AppConfig {
    let mut config = test_config();
    config.websocket.heartbeat_interval_ms = interval_ms;
    config
}

/// Gate that always gives the same answer
#[derive(Debug, Clone)]
pub struct FixedGate(pub Result<AdmissionDecision, AdmissionError>);

impl FixedGate {
    pub fn deny(reason: DenyReason) -> Self {
        Self(Ok(AdmissionDecision::Deny(reason)))
    }

    pub fn failing() -> Self {
        Self(Err(AdmissionError::Unavailable("upstream timeout".to_string())))
    }
}

#[async_trait]
impl AdmissionGate for FixedGate {
    async fn evaluate(&self, _request: &ConnectionRequest) -> Result<AdmissionDecision, AdmissionError> {
        self.0.clone()
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// A match record as the persistence layer would publish it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: i64,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
}

impl MatchRecord {
    pub fn unique() -> Self {
        Self {
            id: unique_match_id(),
            sport: "football".to_string(),
            home_team: "Lions".to_string(),
            away_team: "Tigers".to_string(),
        }
    }
}

/// A commentary record as the persistence layer would publish it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryRecord {
    pub match_id: i64,
    pub minute: u32,
    pub message: String,
}

impl CommentaryRecord {
    pub fn new(match_id: i64, message: &str) -> Self {
        Self {
            match_id,
            minute: 1,
            message: message.to_string(),
        }
    }
}
