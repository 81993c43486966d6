use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use quill_auth::check_ttl;

use crate::error::{ServerError, ServerResult};

pub const ENV_BIND_ADDR: &str = "QUILL_BIND_ADDR";
pub const ENV_SIGNING_KEY: &str = "QUILL_SIGNING_KEY";
pub const ENV_FRONTEND_URL: &str = "QUILL_FRONTEND_URL";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Origin allowed to make credentialed cross-origin requests.
    pub frontend_url: Option<String>,
    /// Hex-encoded 32-byte Ed25519 seed. A random key is generated when unset,
    /// which invalidates every session on restart.
    pub signing_key: Option<String>,
    pub session_ttl_secs: i64,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
    pub password_rounds: u32,
    /// Per-observer event buffer before the observer starts losing events.
    pub event_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            frontend_url: None,
            signing_key: None,
            session_ttl_secs: 24 * 60 * 60,
            secure_cookies: false,
            password_rounds: 10_000,
            event_buffer: 256,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load from `path` (or defaults when `None`), then apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        let config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())?.validate()
    }

    /// Reject settings no server can run with.
    pub fn validate(self) -> ServerResult<Self> {
        check_ttl(self.session_ttl_secs)
            .map_err(|e| ServerError::Config(format!("session_ttl_secs: {e}")))?;
        Ok(self)
    }

    /// Apply overrides from `lookup`, keyed by the `QUILL_*` variable names.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ServerResult<Self> {
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("{ENV_BIND_ADDR}: {e}")))?;
        }
        if let Some(key) = lookup(ENV_SIGNING_KEY).filter(|k| !k.trim().is_empty()) {
            self.signing_key = Some(key);
        }
        if let Some(url) = lookup(ENV_FRONTEND_URL).filter(|u| !u.trim().is_empty()) {
            self.frontend_url = Some(url);
        }
        Ok(self)
    }
}
