use std::{env, net::IpAddr, path::PathBuf, str::FromStr};

use dotenvy::dotenv;
use log::{debug, info, warn};
use serde::Deserialize;
use url::Url;

use crate::errors::ConfigError;

// Server-specific configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub workers: usize,
    /// Base for generated short URLs; the request's scheme and host are used when unset
    pub public_base_url: Option<Url>,
    /// Single browser origin allowed to call the API cross-origin
    pub cors_allowed_origin: Option<String>,
}

// Application-specific configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub log_level: String,
}

// Flat-file store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Start with an empty store (keeping the unreadable file aside) instead of refusing to boot
    pub recover_on_corrupt: bool,
}

// Environment enum for different deployment environments
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!(
                "Invalid environment: {}. Must be one of: development, testing, production",
                s
            )),
        }
    }
}

// Result type for configuration functions
type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub store: StoreConfig,
}

impl Config {
    // Load configuration from environment variables
    pub fn load() -> ConfigResult<Self> {
        match dotenv() {
            Ok(_) => debug!(".env file loaded successfully"),
            Err(e) => warn!("Could not load .env file: {}", e),
        }

        let server = ServerConfig {
            host: get_env_or_default("SERVER_HOST", "0.0.0.0")?,
            port: get_env_or_default("PORT", "3000")?,
            workers: get_env_or_default("SERVER_WORKERS", "4")?,
            public_base_url: get_env_optional("PUBLIC_BASE_URL")?,
            cors_allowed_origin: get_env_optional("CORS_ALLOWED_ORIGIN")?,
        };

        let version = env!("CARGO_PKG_VERSION").to_string();

        let app = AppConfig {
            name: get_env_or_default("APP_NAME", "url-shortener")?,
            version: env::var("APP_VERSION").unwrap_or(version),
            environment: get_env_or_default("APP_ENVIRONMENT", "development")?,
            log_level: get_env_or_default("RUST_LOG", "info")?,
        };

        let store = StoreConfig {
            path: get_env_or_default("DB_FILE", "urls.json")?,
            recover_on_corrupt: get_env_or_default("STORE_RECOVER_ON_CORRUPT", "false")?,
        };

        let config = Config { server, app, store };
        info!("Configuration loaded successfully");
        debug!("Loaded config: {:?}", config);

        Ok(config)
    }
}

/// Helper function to get an env variable with a default value
fn get_env_or_default<T: FromStr>(key: &str, default: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match get_env_optional(key)? {
        Some(value) => Ok(value),
        None => {
            debug!("{} not set, using default: {}", key, default);
            parse_value(key, default)
        }
    }
}

/// Helper function for variables without a default; empty values count as unset
fn get_env_optional<T: FromStr>(key: &str) -> ConfigResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => parse_value(key, val.trim()).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar {
            key: key.to_string(),
            source,
        }),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Parse {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_str() {
        assert_eq!("prod".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("Testing".parse::<Environment>(), Ok(Environment::Testing));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_get_env_or_default_uses_default() {
        let port: u16 = get_env_or_default("SHORTENER_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn test_get_env_or_default_reads_variable() {
        env::set_var("SHORTENER_TEST_WORKERS", " 8 ");
        let workers: usize = get_env_or_default("SHORTENER_TEST_WORKERS", "4").unwrap();
        assert_eq!(workers, 8);
    }

    #[test]
    fn test_parse_error_names_the_key() {
        env::set_var("SHORTENER_TEST_BAD_PORT", "not-a-port");
        let err = get_env_or_default::<u16>("SHORTENER_TEST_BAD_PORT", "3000").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref key, .. } if key == "SHORTENER_TEST_BAD_PORT"));
    }

    #[test]
    fn test_optional_empty_is_none() {
        env::set_var("SHORTENER_TEST_EMPTY_BASE_URL", "");
        let base: Option<Url> = get_env_optional("SHORTENER_TEST_EMPTY_BASE_URL").unwrap();
        assert!(base.is_none());

        env::set_var("SHORTENER_TEST_BASE_URL", "https://sho.rt");
        let base: Option<Url> = get_env_optional("SHORTENER_TEST_BASE_URL").unwrap();
        assert_eq!(base.unwrap().as_str(), "https://sho.rt/");
    }
}
