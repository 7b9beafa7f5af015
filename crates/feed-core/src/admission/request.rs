//! Connection request metadata handed to admission gates

use std::net::{IpAddr, SocketAddr};

/// What an admission gate gets to see about a connection attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Peer address of the TCP connection, if the transport exposes it
    pub remote_addr: Option<SocketAddr>,
    /// `User-Agent` header
    pub user_agent: Option<String>,
    /// `Origin` header
    pub origin: Option<String>,
    /// Request path of the upgrade request
    pub path: String,
}

impl ConnectionRequest {
    /// Create a request for the given path with no other metadata
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the peer address
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the origin
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Peer IP address, if known
    pub fn ip(&self) -> Option<IpAddr> {
        self.remote_addr.map(|addr| addr.ip())
    }
}
