//! Server configuration.
//!
//! Values come from the CLI surface (`kvant-server <ip> <port>
//! <max_clients> <formalism> <log_path>`); the knobs without a CLI position
//! have defaults overridable through `KVANT_*` environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

/// Lowest port the server will bind.
pub const MIN_PORT: u16 = 2000;

/// Default cap on a received frame's declared length.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub ip: IpAddr,

    /// Listening port; must fall in [2000, 65535].
    pub port: u16,

    /// Number of connections the listener accepts before it stops and the
    /// server joins its workers.
    pub max_clients: usize,

    /// State formalism requested by the deployment. Reserved surface: only
    /// `"ket_vector"` is interpreted, anything else is logged and ignored.
    pub formalism: String,

    /// File the tracing output is routed to; stderr when `None`.
    pub log_path: Option<PathBuf>,

    /// Largest accepted request frame in bytes
    /// (`KVANT_MAX_FRAME_LEN` overrides).
    pub max_frame_len: usize,

    /// Bound of each gate/measurement cache
    /// (`KVANT_CACHE_CAPACITY` overrides).
    pub cache_capacity: usize,
}

impl ServerConfig {
    /// Build a configuration from the CLI surface, applying environment
    /// overrides for the remaining knobs.
    pub fn new(
        ip: IpAddr,
        port: u16,
        max_clients: usize,
        formalism: String,
        log_path: Option<PathBuf>,
    ) -> Self {
        Self {
            ip,
            port,
            max_clients,
            formalism,
            log_path,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            cache_capacity: kvant_kernel::DEFAULT_CACHE_CAPACITY,
        }
        .merge_env()
    }

    fn merge_env(mut self) -> Self {
        if let Ok(v) = std::env::var("KVANT_MAX_FRAME_LEN") {
            if let Ok(val) = v.parse() {
                self.max_frame_len = val;
            }
        }
        if let Ok(v) = std::env::var("KVANT_CACHE_CAPACITY") {
            if let Ok(val) = v.parse() {
                self.cache_capacity = val;
            }
        }
        self
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port < MIN_PORT {
            return Err(ConfigError::PortOutOfRange(self.port));
        }
        if self.max_clients == 0 {
            return Err(ConfigError::NoClients);
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        Ok(())
    }

    /// The address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("port {0} outside the allowed range 2000-65535")]
    PortOutOfRange(u16),

    #[error("max_clients must be greater than 0")]
    NoClients,

    #[error("cache capacity must be greater than 0")]
    ZeroCacheCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16, max_clients: usize) -> ServerConfig {
        ServerConfig {
            ip: "127.0.0.1".parse().unwrap(),
            port,
            max_clients,
            formalism: "ket_vector".to_string(),
            log_path: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            cache_capacity: kvant_kernel::DEFAULT_CACHE_CAPACITY,
        }
    }

    #[test]
    fn default_shape_is_valid() {
        assert!(config(2000, 4).validate().is_ok());
    }

    #[test]
    fn low_ports_are_rejected() {
        assert!(matches!(
            config(1999, 4).validate(),
            Err(ConfigError::PortOutOfRange(1999))
        ));
    }

    #[test]
    fn zero_clients_are_rejected() {
        assert!(matches!(
            config(2000, 0).validate(),
            Err(ConfigError::NoClients)
        ));
    }

    #[test]
    fn socket_addr_combines_ip_and_port() {
        let addr = config(2500, 1).socket_addr();
        assert_eq!(addr.port(), 2500);
        assert!(addr.ip().is_loopback());
    }
}
