//! Logging setup for the catalog server and its lifecycle events.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::{parse_bool, ServerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub fn logging_config_from_env() -> LoggingConfig {
    let mut config = LoggingConfig::default();

    if let Ok(level) = env::var("LCDS_LOG_LEVEL") {
        let trimmed = level.trim();
        if !trimmed.is_empty() {
            config.level = trimmed.to_string();
        }
    }

    if let Ok(format) = env::var("LCDS_LOG_FORMAT") {
        if let Some(parsed) = parse_log_format(&format) {
            config.format = parsed;
        }
    }

    if let Ok(include_target) = env::var("LCDS_LOG_TARGET") {
        if let Some(parsed) = parse_bool(&include_target) {
            config.include_target = parsed;
        }
    }

    config
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let env_filter =
        EnvFilter::try_new(config.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_ansi(matches!(config.format, LogFormat::Pretty));

    match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }

    Ok(())
}

/// Where the catalog server reads problems from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Demo { problems: usize },
    Http { base_url: Url, timeout_ms: u64 },
}

impl CatalogSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Demo { .. } => "demo",
            Self::Http { .. } => "http",
        }
    }
}

pub fn log_app_start(config: &LoggingConfig, server: &ServerConfig) {
    info!(
        component = "catalog_server",
        event = "app.start",
        log_level = %config.level,
        log_format = ?config.format,
        include_target = config.include_target,
        origin = %server.origin,
        page_size = server.page_size,
        storage_path = %server.storage_path.display()
    );
}

pub fn log_app_bind(bound_addr: SocketAddr, origin: &str) {
    info!(
        component = "catalog_server",
        event = "app.bind",
        bind_addr = %bound_addr,
        origin,
        routes = "/,/health"
    );
}

/// `reason` names the setting that picked the source.
pub fn log_source_selected(source: &CatalogSource, reason: &str) {
    match source {
        CatalogSource::Demo { problems } => info!(
            component = "catalog_server",
            event = "source.selected",
            source = source.kind(),
            reason,
            problems
        ),
        CatalogSource::Http {
            base_url,
            timeout_ms,
        } => info!(
            component = "catalog_server",
            event = "source.selected",
            source = source.kind(),
            reason,
            base_url = %base_url,
            timeout_ms
        ),
    }
}

fn parse_log_format(raw: &str) -> Option<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" => Some(LogFormat::Pretty),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_env::with_env_vars;

    #[test]
    fn defaults_when_env_missing() {
        let cfg = with_env_vars(
            &[
                ("LCDS_LOG_LEVEL", None),
                ("LCDS_LOG_FORMAT", None),
                ("LCDS_LOG_TARGET", None),
            ],
            logging_config_from_env,
        );

        assert_eq!(cfg, LoggingConfig::default());
    }

    #[test]
    fn parses_json_and_level_and_target_from_env() {
        let cfg = with_env_vars(
            &[
                ("LCDS_LOG_LEVEL", Some("lcds=debug")),
                ("LCDS_LOG_FORMAT", Some("JSON")),
                ("LCDS_LOG_TARGET", Some("off")),
            ],
            logging_config_from_env,
        );

        assert_eq!(cfg.level, "lcds=debug");
        assert_eq!(cfg.format, LogFormat::Json);
        assert!(!cfg.include_target);
    }

    #[test]
    fn invalid_format_or_target_falls_back_to_defaults() {
        let cfg = with_env_vars(
            &[
                ("LCDS_LOG_LEVEL", Some("  ")),
                ("LCDS_LOG_FORMAT", Some("yaml")),
                ("LCDS_LOG_TARGET", Some("maybe")),
            ],
            logging_config_from_env,
        );

        assert_eq!(cfg, LoggingConfig::default());
    }
}
