//! Gateway server setup
//!
//! Provides the WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::admission::AdmissionPolicy;
use crate::connection::{ConnectionRegistry, OutboundFrame};
use crate::protocol::CloseCode;
use axum::{extract::State, routing::get, Json, Router};
use feed_common::{AppConfig, AppError};
use feed_core::AdmissionGate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Health check body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
    pub topics: usize,
}

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
///
/// GET /health
async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: state.registry().connection_count(),
        topics: state.registry().topic_count(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create `GatewayState` with the admission gate described by the config
///
/// Starts the heartbeat sweeper and the event dispatcher.
pub fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    let admission = AdmissionPolicy::from_config(&config.admission)?;

    tracing::info!(
        gate = admission.gate_name(),
        mode = ?admission.mode(),
        "Admission configured"
    );

    Ok(start_state(admission, config))
}

/// Create `GatewayState` around a caller-supplied admission gate
pub fn create_gateway_state_with_gate(
    config: AppConfig,
    gate: Arc<dyn AdmissionGate>,
) -> GatewayState {
    let admission = AdmissionPolicy::new(gate, config.admission.mode);
    start_state(admission, config)
}

fn start_state(admission: AdmissionPolicy, config: AppConfig) -> GatewayState {
    let state = GatewayState::new(ConnectionRegistry::new_shared(), admission, config);
    state.start_background_tasks();
    state
}

/// Run the gateway server until a shutdown signal arrives
pub async fn run_server(state: GatewayState, addr: &str) -> Result<(), AppError> {
    run_server_with_shutdown(state, addr, shutdown_signal()).await
}

/// Bind `addr` and run the gateway server until `shutdown` resolves
pub async fn run_server_with_shutdown<F>(
    state: GatewayState,
    addr: &str,
    shutdown: F,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::config(format!("Failed to bind to {addr}: {e}")))?;

    serve_with_shutdown(listener, state, shutdown).await
}

/// Serve the gateway on a bound listener until `shutdown` resolves
///
/// Every open WebSocket is sent a 1001 close before the listener stops, and
/// the background tasks are stopped once the server returns.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: GatewayState,
    shutdown: F,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("Gateway listening on ws://{}/ws", listener.local_addr()?);

    let app = create_app(state.clone());
    let registry = state.registry().clone();

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            shutdown.await;
            close_all(&registry);
        })
        .await?;

    state.stop_background_tasks();
    tracing::info!("Gateway server stopped");

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.address();

    let state = create_gateway_state(config)?;

    run_server(state, &addr).await
}

/// Upgraded connections are not drained by the server itself
fn close_all(registry: &ConnectionRegistry) {
    let report = registry.send_to_all(&OutboundFrame::Close(CloseCode::GoingAway));
    tracing::info!(closing = report.delivered, "Closing WebSocket connections");
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
