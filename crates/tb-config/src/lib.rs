//! # tb-config
//!
//! Layered application configuration. Sources, lowest priority first:
//! built-in defaults, an optional config file, then `TOPIC_BOARD__*`
//! environment variables (a `.env` file is loaded into the environment
//! first). The resulting [`AppConfig`] is handed to the binary at startup
//! and passed down explicitly; nothing here is process-global.

use config::{Config, Environment, File, FileFormat};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Prefix of every environment override, e.g. `TOPIC_BOARD__SERVER__PORT`.
pub const ENV_PREFIX: &str = "TOPIC_BOARD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection string, e.g. `sqlite:topic_board.db`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for access tokens
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret_key: SecretString,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Period of the background expiration sweep; 0 disables it.
    pub sweep_interval_secs: u64,
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

const DEFAULTS: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[database]
url = "sqlite:topic_board.db"
max_connections = 5

[auth]
secret_key = ""
token_ttl_secs = 86400

[lifecycle]
sweep_interval_secs = 60
"#;

impl AppConfig {
    /// Loads `.env`, then `path` (if it exists), then the environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        if let Ok(env_file) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", env_file.display());
        }

        let mut builder = Config::builder().add_source(File::from_str(DEFAULTS, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_settings(settings)
    }

    /// Builds a config from defaults overlaid with an inline TOML document.
    pub fn from_toml(overrides: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::from_str(overrides, FileFormat::Toml))
            .build()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self, ConfigError> {
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.auth.secret_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "auth.secret_key must be set (env {ENV_PREFIX}__AUTH__SECRET_KEY)"
            )));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_secs must be positive".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be positive".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
