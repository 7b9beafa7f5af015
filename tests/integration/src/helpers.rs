//! Test helpers for integration tests
//!
//! Provides a gateway bound to an ephemeral local port, a WebSocket client
//! speaking the feed protocol, and HTTP helpers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use feed_common::AppConfig;
use feed_core::AdmissionGate;
use feed_gateway::{
    create_gateway_state, create_gateway_state_with_gate, serve_with_shutdown, GatewayState,
};
use futures::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// How long a client waits for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway instance that manages its own lifecycle
pub struct TestGateway {
    pub addr: SocketAddr,
    pub state: GatewayState,
    pub client: Client,
    handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start a gateway with admission disabled
    pub async fn start() -> Result<Self> {
        Self::start_with_config(crate::test_config()).await
    }

    /// Start a gateway with the admission gate described by the config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_gateway_state(config)?;
        Self::serve(state).await
    }

    /// Start a gateway around a custom admission gate
    pub async fn start_with_gate(config: AppConfig, gate: Arc<dyn AdmissionGate>) -> Result<Self> {
        let state = create_gateway_state_with_gate(config, gate);
        Self::serve(state).await
    }

    /// Start a gateway that shuts down gracefully when the returned sender fires
    pub async fn start_with_shutdown(config: AppConfig) -> Result<(Self, oneshot::Sender<()>)> {
        let state = create_gateway_state(config)?;
        let (trigger, signal) = oneshot::channel::<()>();
        let gateway = Self::serve_until(state, async move {
            let _ = signal.await;
        })
        .await?;
        Ok((gateway, trigger))
    }

    async fn serve(state: GatewayState) -> Result<Self> {
        Self::serve_until(state, std::future::pending()).await
    }

    async fn serve_until<F>(state: GatewayState, shutdown: F) -> Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let served = state.clone();
        let handle = tokio::spawn(async move {
            serve_with_shutdown(listener, served, shutdown).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            state,
            client,
            handle,
        })
    }

    /// Get base URL for HTTP requests
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket endpoint URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Open a WebSocket connection (no frames are read)
    pub async fn connect(&self) -> Result<WsClient> {
        let request = self.ws_url().into_client_request()?;
        WsClient::connect(request).await
    }

    /// Open a WebSocket connection with a custom `User-Agent`
    pub async fn connect_with_user_agent(&self, user_agent: &'static str) -> Result<WsClient> {
        let mut request = self.ws_url().into_client_request()?;
        request
            .headers_mut()
            .insert("User-Agent", HeaderValue::from_static(user_agent));
        WsClient::connect(request).await
    }

    /// Open a connection and consume its welcome
    pub async fn connect_welcomed(&self) -> Result<WsClient> {
        let mut client = self.connect().await?;
        client.expect_welcome().await?;
        Ok(client)
    }

    /// Wait for the server task to return
    pub async fn wait_stopped(&mut self) -> Result<()> {
        tokio::time::timeout(RECV_TIMEOUT, &mut self.handle)
            .await
            .context("server did not stop")??;
        Ok(())
    }

    /// Poll until the registry holds `expected` connections
    pub async fn wait_for_connections(&self, expected: usize) -> Result<()> {
        let registry = self.state.registry();
        tokio::time::timeout(RECV_TIMEOUT, async {
            while registry.connection_count() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .with_context(|| {
            format!(
                "expected {expected} connections, registry has {}",
                registry.connection_count()
            )
        })
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.state.stop_background_tasks();
        self.handle.abort();
    }
}

/// WebSocket client speaking the feed protocol
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    async fn connect(
        request: tokio_tungstenite::tungstenite::handshake::client::Request,
    ) -> Result<Self> {
        let (stream, _response) = tokio_tungstenite::connect_async(request).await?;
        Ok(Self { stream })
    }

    /// Send a raw text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.stream.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a raw binary frame
    pub async fn send_binary(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.send(Message::Binary(bytes.to_vec())).await?;
        Ok(())
    }

    /// Send a JSON value as a text frame
    pub async fn send_json(&mut self, value: &Value) -> Result<()> {
        self.send_text(&value.to_string()).await
    }

    /// Send a subscribe request
    pub async fn subscribe(&mut self, match_id: i64) -> Result<()> {
        self.send_json(&serde_json::json!({"type": "subscribe", "matchId": match_id}))
            .await
    }

    /// Send an unsubscribe request
    pub async fn unsubscribe(&mut self, match_id: i64) -> Result<()> {
        self.send_json(&serde_json::json!({"type": "unsubscribe", "matchId": match_id}))
            .await
    }

    /// Wait for the transport to end, failing if any message arrives first
    pub async fn expect_disconnect(&mut self) -> Result<()> {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while let Some(message) = self.stream.next().await {
                match message {
                    Ok(Message::Text(text)) => bail!("expected disconnect, got {text}"),
                    Ok(Message::Close(_)) | Err(_) => return Ok(()),
                    Ok(_) => {}
                }
            }
            Ok(())
        })
        .await
        .context("timed out waiting for disconnect")?
    }

    /// Receive the next JSON message, answering pings along the way
    pub async fn recv_json(&mut self) -> Result<Value> {
        tokio::time::timeout(RECV_TIMEOUT, self.next_json())
            .await
            .context("timed out waiting for a message")?
    }

    async fn next_json(&mut self) -> Result<Value> {
        while let Some(message) = self.stream.next().await {
            match message? {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(frame) => bail!("connection closed: {frame:?}"),
                // Pongs are queued by the client itself
                _ => {}
            }
        }
        bail!("connection ended")
    }

    /// Receive a message and check its `type`
    pub async fn expect_type(&mut self, kind: &str) -> Result<Value> {
        let value = self.recv_json().await?;
        if value["type"] != kind {
            bail!("expected a {kind} message, got {value}");
        }
        Ok(value)
    }

    /// Receive the welcome message
    pub async fn expect_welcome(&mut self) -> Result<()> {
        self.expect_type("welcome").await.map(|_| ())
    }

    /// Subscribe and wait for the acknowledgement
    pub async fn subscribe_acked(&mut self, match_id: i64) -> Result<()> {
        self.subscribe(match_id).await?;
        let ack = self.expect_type("subscribed").await?;
        if ack["matchId"] != match_id {
            bail!("acknowledged the wrong match: {ack}");
        }
        Ok(())
    }

    /// Assert no message arrives for `duration`, answering pings meanwhile
    pub async fn expect_silence(&mut self, duration: Duration) -> Result<()> {
        match tokio::time::timeout(duration, self.next_json()).await {
            Err(_) => Ok(()),
            Ok(Ok(value)) => bail!("expected silence, got {value}"),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Wait for the server's close frame and return its code
    pub async fn expect_close(&mut self) -> Result<u16> {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while let Some(message) = self.stream.next().await {
                match message? {
                    Message::Close(Some(frame)) => return Ok(u16::from(frame.code)),
                    Message::Close(None) => bail!("close frame without a code"),
                    Message::Text(text) => bail!("expected close, got {text}"),
                    _ => {}
                }
            }
            bail!("connection ended without a close frame")
        })
        .await
        .context("timed out waiting for close")?
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}
