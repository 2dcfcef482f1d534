//! Configuration module for the rulebook backend.
//!
//! All configuration is loaded from environment variables (and an optional
//! `.env` file) once at boot.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::chrome::SiteInfo;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid RULEBOOK_BIND_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("RULEBOOK_STORE_URL and RULEBOOK_STORE_KEY must be set together")]
    IncompleteStore,
    #[error("invalid RULEBOOK_LOG_FORMAT {0:?}: expected \"text\" or \"json\"")]
    LogFormat(String),
}

/// Shape of log lines written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::LogFormat(s.to_string())),
        }
    }
}

/// Where records are persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    /// Hosted PostgREST endpoint.
    Rest { url: String, api_key: String },
    /// Local SQLite database file.
    Sqlite { db_path: PathBuf },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Record store backend
    pub store: StoreConfig,
    /// Pre-shared key guarding the admin routes
    pub api_psk: Option<String>,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// Footer links and version label
    pub site: SiteInfo,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let store = match (non_empty("RULEBOOK_STORE_URL"), non_empty("RULEBOOK_STORE_KEY")) {
            (Some(url), Some(api_key)) => StoreConfig::Rest { url, api_key },
            (None, None) => StoreConfig::Sqlite {
                db_path: env::var("RULEBOOK_DB_PATH")
                    .unwrap_or_else(|_| "./data/rulebook.sqlite".to_string())
                    .into(),
            },
            _ => return Err(ConfigError::IncompleteStore),
        };

        let api_psk = non_empty("RULEBOOK_API_PSK");

        let index_path = env::var("RULEBOOK_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_value =
            env::var("RULEBOOK_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                value: bind_value.clone(),
                source,
            })?;

        let log_level = env::var("RULEBOOK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match non_empty("RULEBOOK_LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        let site = SiteInfo {
            discord: non_empty("RULEBOOK_LINK_DISCORD"),
            telegram: non_empty("RULEBOOK_LINK_TELEGRAM"),
            tiktok: non_empty("RULEBOOK_LINK_TIKTOK"),
            version: non_empty("RULEBOOK_VERSION"),
        };

        Ok(Self {
            store,
            api_psk,
            index_path,
            bind_addr,
            log_level,
            log_format,
            site,
        })
    }
}
