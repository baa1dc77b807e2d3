//! Process configuration.
//!
//! Read from environment variables once at startup. Defaults match the
//! conventional deployment layout (certificates mounted under `/etc/ssl`).

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Default plain HTTP port; HTTPS listens on the next port
pub const DEFAULT_PORT: u16 = 3000;
/// Default path to the TLS certificate (PEM)
pub const DEFAULT_TLS_CERT_PATH: &str = "/etc/ssl/server.crt.pem";
/// Default path to the TLS private key (PEM)
pub const DEFAULT_TLS_KEY_PATH: &str = "/etc/ssl/server.key.pem";
/// Default health/metrics port
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Errors in the process configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {source}")]
    InvalidPort {
        var: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error("PORT {0} leaves no room for the HTTPS port (PORT + 1)")]
    NoHttpsPort(u16),
}

/// Webhook process configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Plain HTTP port
    pub port: u16,
    /// TLS certificate path
    pub tls_cert_path: PathBuf,
    /// TLS private key path
    pub tls_key_path: PathBuf,
    /// Health and metrics port
    pub health_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tls_cert_path: PathBuf::from(DEFAULT_TLS_CERT_PATH),
            tls_key_path: PathBuf::from(DEFAULT_TLS_KEY_PATH),
            health_port: DEFAULT_HEALTH_PORT,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_port(&lookup, "PORT", defaults.port)?;
        if port == u16::MAX {
            return Err(ConfigError::NoHttpsPort(port));
        }

        Ok(Self {
            port,
            tls_cert_path: lookup("TLS_CERT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tls_cert_path),
            tls_key_path: lookup("TLS_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tls_key_path),
            health_port: parse_port(&lookup, "HEALTH_PORT", defaults.health_port)?,
        })
    }

    /// HTTPS port (`port + 1`)
    pub fn https_port(&self) -> u16 {
        self.port.saturating_add(1)
    }

    /// Whether both TLS files are present
    pub fn tls_available(&self) -> bool {
        self.tls_cert_path.exists() && self.tls_key_path.exists()
    }
}

fn parse_port(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u16,
) -> Result<u16, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidPort { var, value, source }),
    }
}
