//! WebSocket handler
//!
//! Admits, registers and serves one WebSocket connection.

use crate::connection::{Connection, OutboundFrame};
use crate::handlers::{HeartbeatHandler, MessageRouter};
use crate::protocol::{CloseCode, ServerMessage};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap, Uri},
    response::IntoResponse,
};
use feed_core::ConnectionRequest;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// WebSocket gateway handler
///
/// The admission check runs before the upgrade completes; a refused peer
/// gets an upgraded socket that is immediately closed with the refusal code.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    uri: Uri,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let remote_addr = connect_info.map(|ConnectInfo(addr)| addr);
    let request = connection_request(remote_addr, &headers, &uri);
    let admission = state.admission().check(&request).await;

    let max_payload = state.config().websocket.max_payload_bytes;

    ws.max_message_size(max_payload)
        .max_frame_size(max_payload)
        .on_upgrade(move |socket| async move {
            match admission {
                Ok(()) => handle_socket(state, socket, remote_addr).await,
                Err(code) => refuse(socket, code, remote_addr).await,
            }
        })
}

fn connection_request(
    remote_addr: Option<SocketAddr>,
    headers: &HeaderMap,
    uri: &Uri,
) -> ConnectionRequest {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };

    ConnectionRequest {
        remote_addr,
        user_agent: header_value(header::USER_AGENT),
        origin: header_value(header::ORIGIN),
        path: uri.path().to_owned(),
    }
}

/// Close a refused connection before anything else is sent
async fn refuse(mut socket: WebSocket, code: CloseCode, remote_addr: Option<SocketAddr>) {
    tracing::info!(
        remote_addr = ?remote_addr,
        close_code = code.as_u16(),
        "Connection refused"
    );

    let _ = socket.send(close_message(code)).await;
}

fn close_message(code: CloseCode) -> Message {
    Message::Close(Some(CloseFrame {
        code: code.as_u16(),
        reason: code.description().into(),
    }))
}

/// Handle an admitted WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket, remote_addr: Option<SocketAddr>) {
    let (tx, rx) = mpsc::channel::<OutboundFrame>(state.config().websocket.outbound_buffer);

    // Queued before registration so no broadcast can overtake it
    match OutboundFrame::message(&ServerMessage::Welcome) {
        Ok(welcome) => {
            let _ = tx.try_send(welcome);
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode welcome"),
    }

    let connection = state.registry().register(tx, remote_addr);

    tracing::info!(
        connection_id = %connection.id(),
        remote_addr = ?remote_addr,
        "WebSocket connection established"
    );

    let (ws_sink, ws_stream) = socket.split();

    let mut send_task = tokio::spawn(send_loop(connection.clone(), ws_sink, rx));
    let mut recv_task = tokio::spawn(recv_loop(state.clone(), connection.clone(), ws_stream));

    // Wait for either side to finish, or for the sweeper to evict us
    tokio::select! {
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection.id(), "Receive task ended");
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection.id(), "Send task ended");
        }
        () = connection.terminated() => {
            tracing::debug!(connection_id = %connection.id(), "Connection terminated");
        }
    }

    // Dropping both halves drops the transport
    recv_task.abort();
    send_task.abort();

    state.registry().unregister(connection.id());

    tracing::info!(connection_id = %connection.id(), "WebSocket connection closed");
}

/// Write queued frames to the socket
async fn send_loop(
    connection: Arc<Connection>,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<OutboundFrame>,
) {
    while let Some(frame) = rx.recv().await {
        let message = match frame {
            OutboundFrame::Text(text) => Message::Text(text.to_string()),
            OutboundFrame::Ping => Message::Ping(Vec::new()),
            OutboundFrame::Close(code) => {
                let _ = ws_sink.send(close_message(code)).await;
                break;
            }
        };

        if let Err(e) = ws_sink.send(message).await {
            tracing::warn!(
                connection_id = %connection.id(),
                error = %e,
                "Failed to send message to WebSocket"
            );
            break;
        }
    }
}

/// Read frames from the socket until it closes or errors
async fn recv_loop(
    state: GatewayState,
    connection: Arc<Connection>,
    mut ws_stream: SplitStream<WebSocket>,
) {
    let registry = state.registry();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                MessageRouter::route(registry, &connection, &text);
            }
            Ok(Message::Binary(bytes)) => {
                MessageRouter::route_binary(registry, &connection, &bytes);
            }
            Ok(Message::Pong(_)) => HeartbeatHandler::handle_pong(registry, &connection),
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
                tracing::trace!(connection_id = %connection.id(), "Ping received");
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(
                    connection_id = %connection.id(),
                    code = ?frame.as_ref().map(|f| f.code),
                    "Client closed connection"
                );
                break;
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    error = %e,
                    "WebSocket error"
                );
                break;
            }
        }
    }
}
