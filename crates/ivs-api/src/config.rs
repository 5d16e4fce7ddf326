use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use serde::Deserialize;
use thiserror::Error;

/// Runtime mode, read from `SERVER_MODE`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[serde(alias = "dev", alias = "debug")]
    Development,
    #[serde(alias = "prod", alias = "release")]
    Production,
}

impl Environment {
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration, loaded from environment variables.
///
/// Field names map to upper-case variables (`server_port` ← `SERVER_PORT`).
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    #[serde(default, rename = "server_mode")]
    pub env: Environment,
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    /// Token deny-list is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,
    #[serde(default = "default_refresh_token_expiry_days")]
    pub refresh_token_expiry_days: i64,
    /// Comma separated origins, `*` for any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Enables the LLM provider when set
    #[serde(default)]
    pub ai_api_key: Option<String>,
    #[serde(default = "default_ai_base_url")]
    pub ai_base_url: String,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,
}

fn default_server_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_jwt_expiry_hours() -> i64 {
    24
}

fn default_refresh_token_expiry_days() -> i64 {
    30
}

fn default_allowed_origins() -> String {
    "http://localhost:5173,http://localhost:3000".to_string()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build a config from explicit key/value pairs, with the same rules as
    /// [`ApiConfig::from_env`].
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config: Self = envy::from_iter(vars)?;

        // Treat empty optional values as unset
        config.redis_url = config.redis_url.filter(|v| !v.trim().is_empty());
        config.ai_api_key = config.ai_api_key.filter(|v| !v.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid(
                "JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }
        if self.jwt_expiry_hours <= 0 {
            return Err(ConfigError::Invalid(
                "JWT_EXPIRY_HOURS must be positive".to_string(),
            ));
        }
        if self.refresh_token_expiry_days <= 0 {
            return Err(ConfigError::Invalid(
                "REFRESH_TOKEN_EXPIRY_DAYS must be positive".to_string(),
            ));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::Invalid(
                "BCRYPT_COST must be between 4 and 31".to_string(),
            ));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "DB_MAX_CONNECTIONS must be positive".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "MAX_UPLOAD_BYTES must be positive".to_string(),
            ));
        }
        if self.parsed_allowed_origins().is_empty() {
            return Err(ConfigError::Invalid(
                "ALLOWED_ORIGINS must list at least one origin".to_string(),
            ));
        }
        Ok(())
    }

    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            self.server_port,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_jwt_secret_minimum_32_characters_long";

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/ivs"),
            ("JWT_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_vars(vars(&required())).expect("config should load");

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.jwt_expiry_hours, 24);
        assert_eq!(config.refresh_token_expiry_days, 30);
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.redis_url.is_none());
        assert!(config.ai_api_key.is_none());
        assert_eq!(
            config.parsed_allowed_origins(),
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
    }

    #[test]
    fn test_overrides() {
        let mut pairs = required();
        pairs.extend([
            ("SERVER_PORT", "9000"),
            ("SERVER_MODE", "production"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("ALLOWED_ORIGINS", " https://a.example , https://b.example ,"),
        ]);

        let config = ApiConfig::from_vars(vars(&pairs)).expect("config should load");

        assert_eq!(config.server_port, 9000);
        assert!(config.env.is_production());
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(
            config.parsed_allowed_origins(),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.bind_addr().port(), 9000);
    }

    #[test]
    fn test_mode_aliases() {
        let mut pairs = required();
        pairs.push(("SERVER_MODE", "release"));
        let config = ApiConfig::from_vars(vars(&pairs)).expect("config should load");
        assert_eq!(config.env, Environment::Production);
    }

    #[test]
    fn test_empty_optional_values_are_unset() {
        let mut pairs = required();
        pairs.extend([("REDIS_URL", ""), ("AI_API_KEY", "  ")]);
        let config = ApiConfig::from_vars(vars(&pairs)).expect("config should load");
        assert!(config.redis_url.is_none());
        assert!(config.ai_api_key.is_none());
    }

    #[test]
    fn test_missing_required_variable() {
        let result = ApiConfig::from_vars(vars(&[("JWT_SECRET", SECRET)]));
        assert!(matches!(result, Err(ConfigError::Env(_))));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let result = ApiConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/ivs"),
            ("JWT_SECRET", "short"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut pairs = required();
        pairs.push(("SERVER_PORT", "not-a-port"));
        assert!(ApiConfig::from_vars(vars(&pairs)).is_err());
    }
}
