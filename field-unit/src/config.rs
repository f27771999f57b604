use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use relay_types::rpc::DEFAULT_CENTRAL_PORT;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 2000;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("smoothing window must be at least 1")]
    ZeroWindow,

    #[error("receive timeout must be greater than zero")]
    ZeroTimeout,

    #[error("central server address is empty")]
    EmptyCentralAddress,
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FieldUnitConfig {
    /// UDP port to listen on for sensor datagrams
    pub port: u16,
    /// Base URL of the central server, e.g. `http://127.0.0.1:1099`
    pub central_url: String,
    /// Silence on the socket for this long ends the transmission
    pub timeout: Duration,
    /// Moving-average window (FIELD_UNIT_WINDOW, default 7)
    pub window: NonZeroUsize,
    /// Sent with every relay call so the central server can key batches per unit
    pub unit_id: String,
    /// Upper bound on one relay call
    pub relay_timeout: Duration,
}

impl FieldUnitConfig {
    /// Required values from the caller, everything else from the environment.
    pub fn new(port: u16, central_address: &str) -> Result<Self, ConfigError> {
        let timeout_ms: u64 = env_or("FIELD_UNIT_TIMEOUT_MS", DEFAULT_TIMEOUT_MS);
        let window: usize = env_or("FIELD_UNIT_WINDOW", DEFAULT_WINDOW);
        let relay_timeout_ms: u64 = env_or("FIELD_UNIT_RELAY_TIMEOUT_MS", DEFAULT_RELAY_TIMEOUT_MS);

        let cfg = Self {
            port,
            central_url: central_url(central_address)?,
            timeout: Duration::from_millis(timeout_ms),
            window: NonZeroUsize::new(window).ok_or(ConfigError::ZeroWindow)?,
            unit_id: std::env::var("FIELD_UNIT_ID")
                .unwrap_or_else(|_| format!("field-unit-{port}")),
            relay_timeout: Duration::from_millis(relay_timeout_ms),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Result<Self, ConfigError> {
        self.timeout = Duration::from_millis(ms);
        self.validate()?;
        Ok(self)
    }

    pub fn with_window(mut self, window: usize) -> Result<Self, ConfigError> {
        self.window = NonZeroUsize::new(window).ok_or(ConfigError::ZeroWindow)?;
        Ok(self)
    }

    pub fn with_unit_id(mut self, id: impl Into<String>) -> Self {
        self.unit_id = id.into();
        self
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Accepts `host`, `host:port`, an IP literal, or a full `http(s)://` URL.
/// Bare hosts get the default central port.
pub fn central_url(address: &str) -> Result<String, ConfigError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ConfigError::EmptyCentralAddress);
    }
    if address.starts_with("http://") || address.starts_with("https://") {
        return Ok(address.trim_end_matches('/').to_string());
    }
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(format!("http://{addr}"));
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(format!("http://{}", SocketAddr::new(ip, DEFAULT_CENTRAL_PORT)));
    }
    if address.contains(':') {
        Ok(format!("http://{address}"))
    } else {
        Ok(format!("http://{address}:{DEFAULT_CENTRAL_PORT}"))
    }
}
