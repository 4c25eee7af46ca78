//! Runtime configuration read from `LCDS_*` environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::pagination::PAGE_SIZE;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_STORAGE_PATH: &str = "lcds-storage.json";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid socket address in {var}: {source}")]
    InvalidAddr {
        var: &'static str,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid number in {var}: {raw}")]
    InvalidNumber { var: &'static str, raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Always ends with `/` so endpoint paths join under it.
    pub base_url: Url,
    pub http_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid"),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(raw: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: parse_base_url(raw)?,
            ..Self::default()
        })
    }
}

/// Timing and paging constants for a [`crate::Session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub page_size: usize,
    pub search_debounce_ms: u64,
    pub not_found_redirect_ms: u64,
    pub error_banner_ms: u64,
    pub success_banner_ms: u64,
    pub origin: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            search_debounce_ms: 300,
            not_found_redirect_ms: 2_000,
            error_banner_ms: 3_000,
            success_banner_ms: 4_000,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub origin: String,
    pub use_demo: bool,
    pub storage_path: PathBuf,
    pub page_size: usize,
    pub not_found_redirect_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .expect("default bind address is valid"),
            origin: DEFAULT_ORIGIN.to_string(),
            use_demo: false,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            page_size: PAGE_SIZE,
            not_found_redirect_ms: 2_000,
        }
    }
}

pub fn client_config_from_env() -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();

    if let Some(raw) = non_empty_var("LCDS_API_BASE_URL") {
        config.base_url = parse_base_url(&raw).map_err(|source| ConfigError::InvalidUrl {
            var: "LCDS_API_BASE_URL",
            source,
        })?;
    }

    if let Some(raw) = non_empty_var("LCDS_HTTP_TIMEOUT_MS") {
        config.http_timeout_ms = raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "LCDS_HTTP_TIMEOUT_MS",
                raw,
            })?;
    }

    Ok(config)
}

pub fn session_config_from_env() -> SessionConfig {
    let mut config = SessionConfig::default();
    if let Some(origin) = non_empty_var("LCDS_ORIGIN") {
        config.origin = origin;
    }
    config
}

pub fn server_config_from_env() -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();

    if let Some(raw) = non_empty_var("LCDS_BIND_ADDR") {
        config.bind_addr = raw.parse().map_err(|source| ConfigError::InvalidAddr {
            var: "LCDS_BIND_ADDR",
            source,
        })?;
    }

    if let Some(origin) = non_empty_var("LCDS_ORIGIN") {
        config.origin = origin;
    }

    if let Some(raw) = non_empty_var("LCDS_USE_DEMO") {
        if let Some(parsed) = parse_bool(&raw) {
            config.use_demo = parsed;
        }
    }

    if let Some(path) = non_empty_var("LCDS_STORAGE_PATH") {
        config.storage_path = PathBuf::from(path);
    }

    Ok(config)
}

/// Parses an API base URL, appending a trailing `/` when missing.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
