//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use feed_core::AdmissionMode;
use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub websocket: WebSocketConfig,
    pub admission: AdmissionConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// WebSocket transport and liveness settings
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Interval between heartbeat sweeps
    pub heartbeat_interval_ms: u64,
    /// Largest inbound message the transport accepts
    pub max_payload_bytes: usize,
    /// Depth of each connection's outbound queue
    pub outbound_buffer: usize,
}

impl WebSocketConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

/// Admission gate settings
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    pub enabled: bool,
    pub mode: AdmissionMode,
    /// Connection attempts allowed per window per peer IP
    pub max: u32,
    pub window_ms: u64,
    pub blocked_ips: Vec<IpAddr>,
    /// Case-insensitive substrings matched against `User-Agent`
    pub blocked_user_agents: Vec<String>,
}

impl AdmissionConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

// Default value functions
fn default_app_name() -> String {
    "match-feed".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024
}

fn default_outbound_buffer() -> usize {
    100
}

fn default_admission_enabled() -> bool {
    true
}

fn default_admission_max() -> u32 {
    5
}

fn default_admission_window_ms() -> u64 {
    2_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            websocket: WebSocketConfig {
                heartbeat_interval_ms: default_heartbeat_interval_ms(),
                max_payload_bytes: default_max_payload_bytes(),
                outbound_buffer: default_outbound_buffer(),
            },
            admission: AdmissionConfig {
                enabled: default_admission_enabled(),
                mode: AdmissionMode::default(),
                max: default_admission_max(),
                window_ms: default_admission_window_ms(),
                blocked_ips: Vec::new(),
                blocked_user_agents: Vec::new(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value)
                .ok_or(ConfigError::InvalidValue("APP_ENV", value))?,
            None => default_env(),
        };

        let mode = match lookup("ADMISSION_MODE") {
            Some(value) => AdmissionMode::parse(&value)
                .ok_or(ConfigError::InvalidValue("ADMISSION_MODE", value))?,
            None => AdmissionMode::default(),
        };

        let blocked_ips = lookup("ADMISSION_BLOCKED_IPS")
            .map(|raw| {
                split_list(&raw)
                    .map(|ip| {
                        ip.parse::<IpAddr>()
                            .map_err(|_| ConfigError::InvalidValue("ADMISSION_BLOCKED_IPS", ip))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(default_host),
                port: parse_var(&lookup, "PORT", default_port)?,
            },
            websocket: WebSocketConfig {
                heartbeat_interval_ms: parse_var(
                    &lookup,
                    "HEARTBEAT_INTERVAL_MS",
                    default_heartbeat_interval_ms,
                )?,
                max_payload_bytes: parse_var(
                    &lookup,
                    "WS_MAX_PAYLOAD_BYTES",
                    default_max_payload_bytes,
                )?,
                outbound_buffer: parse_var(&lookup, "WS_OUTBOUND_BUFFER", default_outbound_buffer)?,
            },
            admission: AdmissionConfig {
                enabled: parse_var(&lookup, "ADMISSION_ENABLED", default_admission_enabled)?,
                mode,
                max: parse_var(&lookup, "ADMISSION_MAX", default_admission_max)?,
                window_ms: parse_var(&lookup, "ADMISSION_WINDOW_MS", default_admission_window_ms)?,
                blocked_ips,
                blocked_user_agents: lookup("ADMISSION_BLOCKED_USER_AGENTS")
                    .map(|raw| split_list(&raw).collect())
                    .unwrap_or_default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall the sweeper, the outbound queues or the limiter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.websocket.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("HEARTBEAT_INTERVAL_MS", "0".to_string()));
        }
        if self.websocket.max_payload_bytes == 0 {
            return Err(ConfigError::InvalidValue("WS_MAX_PAYLOAD_BYTES", "0".to_string()));
        }
        if self.websocket.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue("WS_OUTBOUND_BUFFER", "0".to_string()));
        }
        if self.admission.max == 0 {
            return Err(ConfigError::InvalidValue("ADMISSION_MAX", "0".to_string()));
        }
        if self.admission.window_ms == 0 {
            return Err(ConfigError::InvalidValue("ADMISSION_WINDOW_MS", "0".to_string()));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, value)),
        None => Ok(default()),
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
