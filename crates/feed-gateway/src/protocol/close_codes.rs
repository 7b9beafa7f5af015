//! WebSocket close codes
//!
//! The subset of RFC 6455 close codes the gateway sends.

/// WebSocket close codes
///
/// These codes are sent when closing a WebSocket connection to indicate the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Server is going away (shutdown)
    GoingAway = 1001,
    /// Message violates the server's policy (admission: forbidden)
    PolicyViolation = 1008,
    /// Unexpected condition on the server (admission check failed)
    InternalError = 1011,
    /// Temporary condition, retry later (admission: rate limited)
    TryAgainLater = 1013,
}

impl CloseCode {
    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Get the description for this close code, used as the close frame reason
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::GoingAway => "Server shutting down",
            Self::PolicyViolation => "Forbidden",
            Self::InternalError => "Server security error",
            Self::TryAgainLater => "Rate limit exceeded",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GoingAway => "GoingAway",
            Self::PolicyViolation => "PolicyViolation",
            Self::InternalError => "InternalError",
            Self::TryAgainLater => "TryAgainLater",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
