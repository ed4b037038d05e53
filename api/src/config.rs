/// Service configuration module
/// Reads process settings from the environment (optionally seeded by `.env`)

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidConfig(format!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    /// Upper bound on buffered request bodies seen by the validator
    pub max_body_bytes: usize,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnv("DATABASE_URL".into()))?;

        let bind_addr = parse_env("API_BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;
        let db_max_connections = parse_env("DB_MAX_CONNECTIONS", Some(DEFAULT_DB_MAX_CONNECTIONS))?;
        let max_body_bytes = parse_env("MAX_BODY_BYTES", Some(DEFAULT_MAX_BODY_BYTES))?;
        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) => raw.parse()?,
            Err(_) => LogFormat::default(),
        };

        if db_max_connections == 0 {
            return Err(ConfigError::InvalidConfig(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if max_body_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "MAX_BODY_BYTES must be at least 1".to_string(),
            ));
        }

        Ok(AppConfig {
            database_url,
            bind_addr,
            db_max_connections,
            max_body_bytes,
            log_format,
        })
    }

    /// Default settings for `database_url`
    pub fn for_database(database_url: impl Into<String>) -> Self {
        AppConfig {
            database_url: database_url.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_env<T>(key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            ConfigError::InvalidConfig(format!("Invalid value for {} (`{}`): {}", key, raw, e))
        }),
        Err(_) => default.ok_or_else(|| ConfigError::MissingEnv(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u32 = parse_env("HELPDESK_TEST_UNSET_VARIABLE", Some(7)).unwrap();
        assert_eq!(value, 7);

        let missing: Result<u32, _> = parse_env("HELPDESK_TEST_UNSET_VARIABLE", None);
        assert!(matches!(missing, Err(ConfigError::MissingEnv(_))));
    }

    #[test]
    fn test_for_database_defaults() {
        let config = AppConfig::for_database("postgres://localhost/helpdesk");
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    }
}
