//! Configuration management for the dispatch server.
//!
//! Everything is read from the process environment (after loading a `.env`
//! file when present). Variables are prefixed with `MCP_`, except the
//! conventional `DATABASE_URL`.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Relational store connection settings.
    pub database: DatabaseConfig,

    /// Where downloaded media is written.
    pub downloads: DownloadsConfig,

    /// Music catalog upstream settings.
    pub catalog: CatalogConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

impl LoggingConfig {
    /// Read `MCP_LOG_LEVEL` and `MCP_LOG_TIMESTAMPS`.
    ///
    /// Logs nothing itself, so it can run before the subscriber exists.
    pub fn from_env() -> Self {
        let mut logging = Self::default();
        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(raw) = std::env::var("MCP_LOG_TIMESTAMPS") {
            logging.with_timestamps = !matches!(raw.to_lowercase().as_str(), "false" | "0");
        }
        logging
    }
}

/// PostgreSQL connection settings.
///
/// `url` wins over the individual fields when set.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field(
                "password",
                &if self.password.is_empty() { "" } else { "[REDACTED]" },
            )
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// Load database settings from `DATABASE_URL` and `MCP_DB_*`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            host: std::env::var("MCP_DB_HOST").unwrap_or(defaults.host),
            port: parse_env("MCP_DB_PORT", defaults.port),
            database: std::env::var("MCP_DB_NAME").unwrap_or(defaults.database),
            user: std::env::var("MCP_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("MCP_DB_PASSWORD").unwrap_or(defaults.password),
            max_connections: parse_env("MCP_DB_MAX_CONNECTIONS", defaults.max_connections),
            acquire_timeout_secs: parse_env(
                "MCP_DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            ),
        }
    }

    /// Human-readable connection target without credentials.
    pub fn target(&self) -> String {
        match &self.url {
            Some(url) => match url.rsplit_once('@') {
                Some((_, host_part)) => format!("postgres://{}", host_part),
                None => "postgres (from DATABASE_URL)".to_string(),
            },
            None => format!(
                "postgres://{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}

/// Download directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    pub dir: PathBuf,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        let dir = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("Music"))
            .unwrap_or_else(|| PathBuf::from("downloads"));
        Self { dir }
    }
}

/// Upstream catalog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the ListenBrainz API used for trending charts.
    pub listenbrainz_url: String,

    /// Timeout for direct HTTP requests (charts, image transfers).
    pub http_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listenbrainz_url: "https://api.listenbrainz.org".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "music-dispatch-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            database: DatabaseConfig::default(),
            downloads: DownloadsConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Malformed numeric values fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        config.transport = TransportConfig::from_env();
        config.database = DatabaseConfig::from_env();

        if let Ok(dir) = std::env::var("MCP_DOWNLOAD_DIR") {
            config.downloads.dir = PathBuf::from(dir);
        }
        info!("Download directory: {}", config.downloads.dir.display());

        if let Ok(url) = std::env::var("MCP_LISTENBRAINZ_URL") {
            config.catalog.listenbrainz_url = url;
        }
        config.catalog.http_timeout_secs =
            parse_env("MCP_HTTP_TIMEOUT_SECS", config.catalog.http_timeout_secs);

        config
    }
}

/// Parse an environment variable, keeping `default` when unset or malformed.
fn parse_env<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_database_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_DB_HOST", "db.internal");
            std::env::set_var("MCP_DB_PORT", "6543");
            std::env::set_var("MCP_DB_MAX_CONNECTIONS", "not-a-number");
        }
        let config = DatabaseConfig::from_env();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.max_connections, 5);
        unsafe {
            std::env::remove_var("MCP_DB_HOST");
            std::env::remove_var("MCP_DB_PORT");
            std::env::remove_var("MCP_DB_MAX_CONNECTIONS");
        }
    }

    #[test]
    fn test_download_dir_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_DOWNLOAD_DIR", "/tmp/music-dispatch");
            std::env::set_var("MCP_HTTP_TIMEOUT_SECS", "7");
        }
        let config = Config::from_env();
        assert_eq!(config.downloads.dir, PathBuf::from("/tmp/music-dispatch"));
        assert_eq!(config.catalog.http_timeout_secs, 7);
        unsafe {
            std::env::remove_var("MCP_DOWNLOAD_DIR");
            std::env::remove_var("MCP_HTTP_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_database_secrets_redacted_in_debug() {
        let db = DatabaseConfig {
            url: Some("postgres://app:hunter2@db:5432/app".to_string()),
            password: "super_secret_password".to_string(),
            ..DatabaseConfig::default()
        };
        let debug_str = format!("{:?}", db);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_password"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_database_secrets_not_serialized() {
        let db = DatabaseConfig {
            url: Some("postgres://app:hunter2@db:5432/app".to_string()),
            password: "super_secret_password".to_string(),
            ..DatabaseConfig::default()
        };
        let json = serde_json::to_string(&db).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("super_secret_password"));
        assert!(json.contains("\"host\":\"localhost\""));
    }

    #[test]
    fn test_logging_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_LOG_LEVEL", "debug");
            std::env::set_var("MCP_LOG_TIMESTAMPS", "0");
        }
        let logging = LoggingConfig::from_env();
        assert_eq!(logging.level, "debug");
        assert!(!logging.with_timestamps);
        unsafe {
            std::env::remove_var("MCP_LOG_LEVEL");
            std::env::remove_var("MCP_LOG_TIMESTAMPS");
        }
        assert_eq!(LoggingConfig::from_env().level, "info");
    }

    #[test]
    fn test_database_target_hides_credentials() {
        let db = DatabaseConfig {
            url: Some("postgres://app:hunter2@db:5432/app".to_string()),
            ..DatabaseConfig::default()
        };
        assert_eq!(db.target(), "postgres://db:5432/app");

        let db = DatabaseConfig::default();
        assert_eq!(db.target(), "postgres://postgres@localhost:5432/postgres");
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.server.name, "music-dispatch-server");
        assert_eq!(config.catalog.listenbrainz_url, "https://api.listenbrainz.org");
        assert_eq!(config.database.max_connections, 5);
    }
}
