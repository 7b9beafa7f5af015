//! Individual WebSocket connection
//!
//! The registry-owned record for one live transport session. The socket
//! itself stays with the connection's tasks; this record only holds the
//! outbound queue, the liveness flag, and the termination signal.

use crate::protocol::{CloseCode, ServerMessage};
use chrono::{DateTime, Utc};
use feed_core::ConnectionId;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// A frame queued for the connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Pre-encoded JSON text, shared across a fan-out
    Text(Arc<str>),
    /// Liveness probe (WebSocket Ping control frame)
    Ping,
    /// Close the transport with a code
    Close(CloseCode),
}

impl OutboundFrame {
    /// Encode a server message into a text frame
    pub fn message(message: &ServerMessage) -> Result<Self, serde_json::Error> {
        message.to_json().map(|json| Self::Text(json.into()))
    }
}

/// Why a frame could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// Writer task is gone
    #[error("connection is closed")]
    Closed,
    /// Outbound queue is full; the frame was dropped
    #[error("outbound queue is full")]
    Full,
    /// Message could not be serialized; nothing was queued
    #[error("message could not be encoded")]
    Encode,
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection ID
    id: ConnectionId,

    /// Channel to the writer task
    sender: mpsc::Sender<OutboundFrame>,

    /// Cleared when a probe is sent, set again by a pong
    alive: AtomicBool,

    /// Set once the connection has been told to drop its transport
    terminated: AtomicBool,

    /// Wakes the socket task on termination
    terminate_signal: Notify,

    /// Peer address, if known
    remote_addr: Option<SocketAddr>,

    /// Connection registration time
    connected_at: DateTime<Utc>,
}

impl Connection {
    /// Create a new connection
    pub fn new(sender: mpsc::Sender<OutboundFrame>, remote_addr: Option<SocketAddr>) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::generate(),
            sender,
            alive: AtomicBool::new(true),
            terminated: AtomicBool::new(false),
            terminate_signal: Notify::new(),
            remote_addr,
            connected_at: Utc::now(),
        })
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the peer address
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Get the registration time
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Whether the connection answered the last probe
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Set the liveness flag, returning its previous value
    pub(crate) fn swap_alive(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }

    /// Queue a frame without waiting
    ///
    /// A full queue drops the frame; delivery is best-effort.
    pub fn try_send(&self, frame: OutboundFrame) -> Result<(), SendError> {
        self.sender.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Encode and queue a server message
    pub fn send_message(&self, message: &ServerMessage) -> Result<(), SendError> {
        self.send_encoded(message.kind(), OutboundFrame::message(message))
    }

    fn send_encoded(
        &self,
        kind: &'static str,
        encoded: Result<OutboundFrame, serde_json::Error>,
    ) -> Result<(), SendError> {
        match encoded {
            Ok(frame) => self.try_send(frame),
            Err(e) => {
                tracing::error!(
                    connection_id = %self.id,
                    kind,
                    error = %e,
                    "Failed to encode message"
                );
                Err(SendError::Encode)
            }
        }
    }

    /// Tell the socket task to drop the transport without a close handshake
    pub fn terminate(&self) {
        if !self.terminated.swap(true, Ordering::AcqRel) {
            self.terminate_signal.notify_one();
        }
    }

    /// Whether `terminate` has been called
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Resolves once `terminate` has been called
    pub async fn terminated(&self) {
        if self.is_terminated() {
            return;
        }
        self.terminate_signal.notified().await;
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .field("remote_addr", &self.remote_addr)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}
