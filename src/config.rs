//! Runtime configuration
//!
//! Values come from an optional TOML file, then environment variables, then
//! command-line flags (applied by the binary).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::parse_bool;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub media_root: PathBuf,
    pub port: u16,
    pub cors_origin: Option<String>,
    pub registration_key: String,
    pub redis: RedisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://mutation-guard.db?mode=rwc".to_string(),
            media_root: PathBuf::from("media"),
            port: 3000,
            cors_origin: None,
            registration_key: "registered_users".to_string(),
            redis: RedisConfig::default(),
        }
    }
}

impl Config {
    /// Load the file (when given) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.with_env(|name| std::env::var(name).ok())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Apply overrides from an environment lookup
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = database_url(&url);
        }
        if let Some(root) = lookup("MEDIA_ROOT") {
            self.media_root = PathBuf::from(root);
        }
        if let Some(key) = lookup("REGISTRATION_KEY") {
            self.registration_key = key;
        }
        if let Some(host) = lookup("REDIS_SERVER") {
            self.redis.host = host;
        }
        if let Some(port) = lookup("REDIS_PORT") {
            self.redis.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid REDIS_PORT: {}", port))?;
        }
        if let Some(db) = lookup("REDIS_DB") {
            self.redis.db = db
                .trim()
                .parse()
                .with_context(|| format!("Invalid REDIS_DB: {}", db))?;
        }
        if let Some(enabled) = lookup("REDIS_ENABLED") {
            self.redis.enabled = parse_bool(&enabled)?;
        }
        Ok(self)
    }
}

/// Map a database path or URL to a sea-orm connection URL
pub fn database_url(value: &str) -> String {
    match value {
        ":memory:" => "sqlite::memory:".to_string(),
        url if url.contains("://") || url.starts_with("sqlite:") => url.to_string(),
        path => format!("sqlite://{}?mode=rwc", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.redis.url(), "redis://localhost:6379/0");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml(
            r#"
port = 8080

[redis]
host = "cache"
"#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.redis.host, "cache");
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.registration_key, "registered_users");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", ":memory:"),
            ("REDIS_SERVER", "redis.internal"),
            ("REDIS_PORT", "6380"),
            ("REDIS_DB", "2"),
            ("REDIS_ENABLED", "no"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_env(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.redis.url(), "redis://redis.internal:6380/2");
        assert!(!config.redis.enabled);
    }

    #[test]
    fn test_invalid_env_value() {
        let result = Config::default().with_env(|name| {
            (name == "REDIS_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_database_url() {
        assert_eq!(database_url("data.db"), "sqlite://data.db?mode=rwc");
        assert_eq!(database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            database_url("postgres://localhost/app"),
            "postgres://localhost/app"
        );
    }
}
