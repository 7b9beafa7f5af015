//! Gateway Integration Tests
//!
//! Each test starts its own gateway on an ephemeral local port; no external
//! services are needed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::sync::Arc;
use std::time::Duration;

use feed_core::{DenyReason, EventPublisher, MatchId};
use feed_gateway::HealthResponse;
use integration_tests::*;
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test]
async fn test_subscribe_then_receive_commentary() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();
    let match_id = unique_match_id();

    client.subscribe_acked(match_id).await.unwrap();

    gateway
        .state
        .publisher()
        .publish_commentary(MatchId::new(match_id), &json!({"message": "GOAL!"}))
        .unwrap();

    let commentary = client.recv_json().await.unwrap();
    assert_eq!(
        commentary,
        json!({"type": "commentary", "data": {"message": "GOAL!"}})
    );
}

#[tokio::test]
async fn test_invalid_json_keeps_connection_open() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();

    client.send_text("this is not json").await.unwrap();
    assert_eq!(
        client.recv_json().await.unwrap(),
        json!({"type": "error", "message": "Invalid JSON"})
    );

    // Connection is still usable
    client.subscribe_acked(unique_match_id()).await.unwrap();
    assert_eq!(gateway.state.registry().connection_count(), 1);
}

#[tokio::test]
async fn test_unrecognized_messages_get_no_reply() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();

    client.send_json(&json!({"type": "hello"})).await.unwrap();
    client
        .send_json(&json!({"type": "subscribe", "matchId": "42"}))
        .await
        .unwrap();
    client.expect_silence(Duration::from_millis(200)).await.unwrap();

    assert_eq!(gateway.state.registry().topic_count(), 0);
}

#[tokio::test]
async fn test_integral_float_match_id_is_accepted() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();

    client
        .send_text(r#"{"type":"subscribe","matchId":1e2}"#)
        .await
        .unwrap();
    let ack = client.expect_type("subscribed").await.unwrap();
    assert_eq!(ack["matchId"], 100);

    client
        .send_json(&json!({"type": "subscribe", "matchId": 4.5}))
        .await
        .unwrap();
    client.expect_silence(Duration::from_millis(200)).await.unwrap();

    assert_eq!(gateway.state.registry().subscriber_count(MatchId::new(100)), 1);
    assert_eq!(gateway.state.registry().topic_count(), 1);
}

#[tokio::test]
async fn test_oversized_frame_ends_connection() {
    let mut config = test_config();
    config.websocket.max_payload_bytes = 64;
    let gateway = TestGateway::start_with_config(config).await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();
    gateway.wait_for_connections(1).await.unwrap();

    let padding = "x".repeat(256);
    client
        .send_json(&json!({"type": "subscribe", "matchId": 1, "padding": padding}))
        .await
        .unwrap();

    client.expect_disconnect().await.unwrap();
    gateway.wait_for_connections(0).await.unwrap();
    assert_eq!(gateway.state.registry().topic_count(), 0);
}

#[tokio::test]
async fn test_unsubscribe_stops_commentary() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();
    let match_id = unique_match_id();

    client.subscribe_acked(match_id).await.unwrap();
    client.unsubscribe(match_id).await.unwrap();
    let ack = client.expect_type("unsubscribed").await.unwrap();
    assert_eq!(ack["matchId"], match_id);

    let report = gateway
        .state
        .broadcaster()
        .broadcast_commentary(MatchId::new(match_id), &CommentaryRecord::new(match_id, "Corner"));
    assert_eq!(report.targeted(), 0);
    client.expect_silence(Duration::from_millis(200)).await.unwrap();
}

#[tokio::test]
async fn test_unsubscribe_without_subscription_is_acknowledged() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();

    client.unsubscribe(99).await.unwrap();
    let ack = client.expect_type("unsubscribed").await.unwrap();
    assert_eq!(ack, json!({"type": "unsubscribed", "matchId": 99}));
}

#[tokio::test]
async fn test_binary_frames_are_routed() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();

    client
        .send_binary(br#"{"type":"subscribe","matchId":5}"#)
        .await
        .unwrap();
    client.expect_type("subscribed").await.unwrap();

    client.send_binary(&[0xc3, 0x28]).await.unwrap();
    assert_eq!(
        client.recv_json().await.unwrap(),
        json!({"type": "error", "message": "Invalid JSON"})
    );
}

// ============================================================================
// Broadcast Tests
// ============================================================================

#[tokio::test]
async fn test_match_created_reaches_connected_clients_only() {
    let gateway = TestGateway::start().await.unwrap();
    let mut a = gateway.connect_welcomed().await.unwrap();
    let mut b = gateway.connect_welcomed().await.unwrap();

    let record = MatchRecord::unique();
    let report = gateway.state.broadcaster().broadcast_match_created(&record);
    assert_eq!(report.delivered, 2);

    // Connected after the broadcast
    let mut c = gateway.connect_welcomed().await.unwrap();

    for client in [&mut a, &mut b] {
        let message = client.expect_type("match_created").await.unwrap();
        assert_eq!(message["data"]["id"], record.id);
        assert_eq!(message["data"]["homeTeam"], "Lions");
    }
    c.expect_silence(Duration::from_millis(200)).await.unwrap();
}

#[tokio::test]
async fn test_commentary_reaches_only_subscribers() {
    let gateway = TestGateway::start().await.unwrap();
    let mut fan = gateway.connect_welcomed().await.unwrap();
    let mut other = gateway.connect_welcomed().await.unwrap();
    let match_id = unique_match_id();

    fan.subscribe_acked(match_id).await.unwrap();
    other.subscribe_acked(unique_match_id()).await.unwrap();

    gateway
        .state
        .publisher()
        .publish_commentary(MatchId::new(match_id), &CommentaryRecord::new(match_id, "Kick-off"))
        .unwrap();

    let message = fan.expect_type("commentary").await.unwrap();
    assert_eq!(message["data"]["message"], "Kick-off");
    other.expect_silence(Duration::from_millis(200)).await.unwrap();
}

#[tokio::test]
async fn test_disconnect_clears_subscriptions() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();
    let match_id = unique_match_id();

    client.subscribe_acked(match_id).await.unwrap();
    assert_eq!(gateway.state.registry().subscriber_count(MatchId::new(match_id)), 1);

    client.close().await.unwrap();
    gateway.wait_for_connections(0).await.unwrap();

    assert_eq!(gateway.state.registry().subscriber_count(MatchId::new(match_id)), 0);
    assert_eq!(gateway.state.registry().topic_count(), 0);
}

// ============================================================================
// Heartbeat Tests
// ============================================================================

#[tokio::test]
async fn test_unresponsive_client_is_evicted() {
    let gateway = TestGateway::start_with_config(fast_heartbeat_config(100))
        .await
        .unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();
    let match_id = unique_match_id();
    client.subscribe_acked(match_id).await.unwrap();

    // Stop reading: pings go unanswered
    gateway.wait_for_connections(0).await.unwrap();

    assert_eq!(gateway.state.registry().subscriber_count(MatchId::new(match_id)), 0);
    drop(client);
}

#[tokio::test]
async fn test_responsive_client_survives_sweeps() {
    let gateway = TestGateway::start_with_config(fast_heartbeat_config(100))
        .await
        .unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();

    // Reading answers every ping
    client.expect_silence(Duration::from_millis(600)).await.unwrap();

    assert_eq!(gateway.state.registry().connection_count(), 1);
}

// ============================================================================
// Admission Tests
// ============================================================================

#[tokio::test]
async fn test_rate_limited_connection_is_closed_with_1013() {
    let gate = Arc::new(FixedGate::deny(DenyReason::RateLimited));
    let gateway = TestGateway::start_with_gate(test_config(), gate).await.unwrap();

    let mut client = gateway.connect().await.unwrap();

    // Close arrives before any welcome
    assert_eq!(client.expect_close().await.unwrap(), 1013);
    assert_eq!(gateway.state.registry().connection_count(), 0);
}

#[tokio::test]
async fn test_forbidden_connection_is_closed_with_1008() {
    let gate = Arc::new(FixedGate::deny(DenyReason::Forbidden));
    let gateway = TestGateway::start_with_gate(test_config(), gate).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), 1008);
}

#[tokio::test]
async fn test_gate_failure_fails_closed() {
    let gate = Arc::new(FixedGate::failing());
    let gateway = TestGateway::start_with_gate(test_config(), gate).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), 1011);
    assert_eq!(gateway.state.registry().connection_count(), 0);
}

#[tokio::test]
async fn test_dry_run_admits_denied_connections() {
    let mut config = test_config();
    config.admission.mode = feed_core::AdmissionMode::DryRun;
    let gate = Arc::new(FixedGate::deny(DenyReason::Forbidden));
    let gateway = TestGateway::start_with_gate(config, gate).await.unwrap();

    let mut client = gateway.connect_welcomed().await.unwrap();
    client.subscribe_acked(unique_match_id()).await.unwrap();
}

#[tokio::test]
async fn test_local_gate_rate_limits_per_peer() {
    let mut config = test_config();
    config.admission.enabled = true;
    config.admission.max = 2;
    config.admission.window_ms = 60_000;
    let gateway = TestGateway::start_with_config(config).await.unwrap();

    let _first = gateway.connect_welcomed().await.unwrap();
    let _second = gateway.connect_welcomed().await.unwrap();

    let mut third = gateway.connect().await.unwrap();
    assert_eq!(third.expect_close().await.unwrap(), 1013);
    assert_eq!(gateway.state.registry().connection_count(), 2);
}

#[tokio::test]
async fn test_local_gate_blocks_user_agents() {
    let mut config = test_config();
    config.admission.enabled = true;
    config.admission.blocked_user_agents = vec!["scraper".to_string()];
    let gateway = TestGateway::start_with_config(config).await.unwrap();

    let mut bot = gateway
        .connect_with_user_agent("Evil-Scraper/1.0")
        .await
        .unwrap();
    assert_eq!(bot.expect_close().await.unwrap(), 1008);

    gateway.connect_welcomed().await.unwrap();
}

// ============================================================================
// Shutdown Tests
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_clients_with_1001() {
    let (mut gateway, trigger) = TestGateway::start_with_shutdown(test_config()).await.unwrap();
    let mut first = gateway.connect_welcomed().await.unwrap();
    let mut second = gateway.connect_welcomed().await.unwrap();
    gateway.wait_for_connections(2).await.unwrap();

    trigger.send(()).unwrap();

    assert_eq!(first.expect_close().await.unwrap(), 1001);
    assert_eq!(second.expect_close().await.unwrap(), 1001);

    gateway.wait_stopped().await.unwrap();
    assert!(gateway.connect().await.is_err());
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let gateway = TestGateway::start().await.unwrap();
    let mut client = gateway.connect_welcomed().await.unwrap();
    client.subscribe_acked(unique_match_id()).await.unwrap();

    let response = gateway.get("/health").await.unwrap();
    let health: HealthResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.connections, 1);
    assert_eq!(health.topics, 1);
}
