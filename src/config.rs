//! Configuration for Minisocks
//!
//! The server consumes a listening host and port; the optional knobs
//! (request timeout, UDP in-flight cap) are off by default so that the
//! baseline behavior — no deadlines, unbounded per-datagram tasks —
//! is preserved unless explicitly configured.

use crate::error::ProxyError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening host for both the TCP listener and the UDP socket
    pub host: String,

    /// Listening port
    pub port: u16,

    /// Optional deadline in seconds around the upstream connect and
    /// the UDP round trip. Absent means no timeout anywhere.
    pub request_timeout_secs: Option<u64>,

    /// Optional cap on concurrently in-flight UDP exchanges.
    /// Absent means unbounded.
    pub udp_max_inflight: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 1082,
            request_timeout_secs: None,
            udp_max_inflight: None,
        }
    }
}

impl ServerConfig {
    /// The `host:port` endpoint string to bind.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured request deadline, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ProxyError> {
    let content = std::fs::read_to_string(path.as_ref())?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<ServerConfig, ProxyError> {
    toml::from_str(content).map_err(|e| ProxyError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 1082);
        assert_eq!(config.endpoint(), "127.0.0.1:1082");
        assert!(config.request_timeout().is_none());
        assert!(config.udp_max_inflight.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
host = "0.0.0.0"
port = 1080
request_timeout_secs = 15
udp_max_inflight = 256
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 1080);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.udp_max_inflight, Some(256));
    }

    #[test]
    fn test_parse_invalid_config() {
        let err = parse_config("port = \"not a port\"").unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"10.0.0.1\"\nport = 9050").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 9050);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/minisocks.toml").unwrap_err();
        assert!(matches!(err, ProxyError::Io(_)));
    }
}
