use config::{Config as ConfigLoader, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use invoice_persist::{StoreBackend, StoreConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    #[serde(default)]
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables with SERVER_, STORE_ and LOG_ prefixes
    ///
    /// `MONGODB_URI` is a secret and only ever read from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        let config = with_env_overrides(builder)?.build()?;
        let mut cfg: Config = config.try_deserialize()?;

        if let Ok(uri) = std::env::var("MONGODB_URI") {
            cfg.store.mongodb_uri = Some(uri);
        }
        cfg.validate()?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.store.backend {
            StoreBackend::Http if self.store.base_url.is_none() => Err(ConfigError::Message(
                "store.base_url is required for the http backend".to_string(),
            )),
            StoreBackend::Mongodb if self.store.mongodb_uri.is_none() => Err(ConfigError::Message(
                "MONGODB_URI environment variable is required for the mongodb backend".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

// Single-word keys map straight from `PREFIX_KEY`; keys containing an
// underscore are read explicitly since `_` is also the nesting separator.
fn with_env_overrides(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;
    for prefix in ["SERVER", "STORE", "LOG"] {
        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .keep_prefix(true)
                .separator("_")
                .try_parsing(true),
        );
    }

    builder
        .set_override_option(
            "server.request_timeout_secs",
            std::env::var("SERVER_REQUEST_TIMEOUT_SECS").ok(),
        )?
        .set_override_option("store.base_url", std::env::var("STORE_BASE_URL").ok())?
        .set_override_option("store.timeout_ms", std::env::var("STORE_TIMEOUT_MS").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [store]
            backend = "http"
            base_url = "http://threads.internal:8000"
            timeout_ms = 2500

            [log]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.store.backend, StoreBackend::Http);
        assert_eq!(config.store.timeout_ms, 2500);
        assert_eq!(config.log.format, "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_sections_default() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8000
        "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(!config.cors.enabled);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.server.addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_backends_require_their_connection_settings() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8000

            [store]
            backend = "mongodb"
        "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.store.database.as_deref(), Some("smart_invoice"));
    }
}
