//! # feed-gateway
//!
//! WebSocket gateway for the live match feed: connection registry and
//! subscription index, heartbeat sweeping, message routing, broadcasting
//! and connection admission.

pub mod admission;
pub mod broadcast;
pub mod connection;
pub mod handlers;
pub mod heartbeat;
pub mod protocol;
pub mod server;

pub use admission::{AdmissionPolicy, LocalAdmissionGate};
pub use broadcast::{Broadcaster, ChannelPublisher, EventDispatcher};
pub use connection::{Connection, ConnectionRegistry, DeliveryReport, OutboundFrame};
pub use heartbeat::{HeartbeatSweeper, SweepReport};
pub use protocol::{ClientMessage, CloseCode, ServerMessage};
pub use server::{
    create_app, create_gateway_state, create_gateway_state_with_gate, create_router, run,
    run_server, run_server_with_shutdown, serve_with_shutdown, GatewayState, HealthResponse,
};
