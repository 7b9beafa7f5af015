//! Configuration structs

mod app_config;

pub use app_config::{
    AdmissionConfig, AppConfig, AppSettings, ConfigError, Environment, ServerConfig,
    WebSocketConfig,
};
