use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::security::{Argon2Config, Key};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub root: RootConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub writer_url: String,
    pub reader_urls: Vec<String>,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub token_expiry_secs: i64,
    pub token_refresh_threshold_secs: i64,
    pub token_issuer: String,
    pub argon2: Argon2Config,
    pub key_seed: Option<String>,
    pub signing_key_seed: Option<String>,
    pub cors_origins: Vec<String>,
}

// Seeds are key material; keep them out of logs.
impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("token_refresh_threshold_secs", &self.token_refresh_threshold_secs)
            .field("token_issuer", &self.token_issuer)
            .field("argon2", &self.argon2)
            .field("key_seed", &self.key_seed.as_ref().map(|_| "****"))
            .field("signing_key_seed", &self.signing_key_seed.as_ref().map(|_| "****"))
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

/// Well-known root identity. When unset, the server bootstraps a fresh one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    pub org_id: Option<String>,
    pub user_id: Option<String>,
}

/// Immutable key material, derived once at startup
#[derive(Debug, Clone)]
pub struct Keys {
    pub key: Key,
    pub signing_key: Key,
}

const DAY_SECS: i64 = 24 * 60 * 60;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.writer_url = v;
        }
        if let Ok(v) = env::var("DATABASE_REPLICA_URLS") {
            self.database.reader_urls = split_list(&v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_TOKEN_EXPIRY_SECS") {
            self.security.token_expiry_secs = v.parse().unwrap_or(self.security.token_expiry_secs);
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_REFRESH_THRESHOLD_SECS") {
            self.security.token_refresh_threshold_secs =
                v.parse().unwrap_or(self.security.token_refresh_threshold_secs);
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_ISSUER") {
            self.security.token_issuer = v;
        }
        if let Ok(v) = env::var("SECURITY_ARGON2_MEMORY_KIB") {
            self.security.argon2.memory_kib = v.parse().unwrap_or(self.security.argon2.memory_kib);
        }
        if let Ok(v) = env::var("SECURITY_ARGON2_ITERATIONS") {
            self.security.argon2.iterations = v.parse().unwrap_or(self.security.argon2.iterations);
        }
        if let Ok(v) = env::var("SECURITY_ARGON2_PARALLELISM") {
            self.security.argon2.parallelism = v.parse().unwrap_or(self.security.argon2.parallelism);
        }
        if let Ok(v) = env::var("ORGKEEP_KEY") {
            self.security.key_seed = Some(v);
        }
        if let Ok(v) = env::var("ORGKEEP_SIGNING_KEY") {
            self.security.signing_key_seed = Some(v);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        // Root identity
        if let Ok(v) = env::var("ROOT_ORG_ID") {
            self.root.org_id = Some(v);
        }
        if let Ok(v) = env::var("ROOT_USER_ID") {
            self.root.user_id = Some(v);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                writer_url: crate::database::manager::IN_MEMORY_URL.to_string(),
                reader_urls: vec![],
                max_connections: 10,
            },
            security: SecurityConfig {
                token_expiry_secs: 30 * DAY_SECS,
                token_refresh_threshold_secs: 30,
                token_issuer: "orgkeep".to_string(),
                argon2: Argon2Config::default(),
                key_seed: None,
                signing_key_seed: None,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            root: RootConfig::default(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                writer_url: String::new(),
                reader_urls: vec![],
                max_connections: 20,
            },
            security: SecurityConfig {
                token_expiry_secs: DAY_SECS,
                token_refresh_threshold_secs: 30,
                token_issuer: "orgkeep".to_string(),
                argon2: Argon2Config::default(),
                key_seed: None,
                signing_key_seed: None,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            root: RootConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                writer_url: String::new(),
                reader_urls: vec![],
                max_connections: 50,
            },
            security: SecurityConfig {
                token_expiry_secs: DAY_SECS,
                token_refresh_threshold_secs: 30,
                token_issuer: "orgkeep".to_string(),
                argon2: Argon2Config::default(),
                key_seed: None,
                signing_key_seed: None,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            root: RootConfig::default(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.writer_url.is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.security.token_expiry_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: "SECURITY_TOKEN_EXPIRY_SECS",
                reason: "must be positive".to_string(),
            });
        }
        if self.security.token_refresh_threshold_secs < 0 {
            return Err(ConfigError::Invalid {
                name: "SECURITY_TOKEN_REFRESH_THRESHOLD_SECS",
                reason: "must not be negative".to_string(),
            });
        }
        if self.root.org_id.is_some() != self.root.user_id.is_some() {
            return Err(ConfigError::Invalid {
                name: "ROOT_ORG_ID/ROOT_USER_ID",
                reason: "set both or neither".to_string(),
            });
        }
        if !self.is_development() {
            if self.security.key_seed.is_none() {
                return Err(ConfigError::Missing("ORGKEEP_KEY"));
            }
            if self.security.signing_key_seed.is_none() {
                return Err(ConfigError::Missing("ORGKEEP_SIGNING_KEY"));
            }
        }
        Ok(())
    }

    /// Turn the configured seeds into keys. Development falls back to random
    /// keys, which makes stored ciphertexts unreadable after a restart.
    pub fn keys(&self) -> Result<Keys, ConfigError> {
        Ok(Keys {
            key: self.key_from_seed(self.security.key_seed.as_deref(), "ORGKEEP_KEY")?,
            signing_key: self.key_from_seed(
                self.security.signing_key_seed.as_deref(),
                "ORGKEEP_SIGNING_KEY",
            )?,
        })
    }

    fn key_from_seed(&self, seed: Option<&str>, name: &'static str) -> Result<Key, ConfigError> {
        match seed {
            Some(seed) if !seed.is_empty() => Ok(Key::from_seed(seed)),
            _ if self.is_development() => {
                warn!(setting = name, "No key seed configured, generated a random key");
                Ok(Key::random())
            }
            _ => Err(ConfigError::Missing(name)),
        }
    }
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.token_expiry_secs, 30 * DAY_SECS);
        assert_eq!(config.security.token_refresh_threshold_secs, 30);
        assert!(config.validate().is_ok());
        assert!(config.keys().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.security.token_expiry_secs, DAY_SECS);
        assert_eq!(config.validate(), Err(ConfigError::Missing("DATABASE_URL")));
        assert!(matches!(config.keys(), Err(ConfigError::Missing("ORGKEEP_KEY"))));
    }

    #[test]
    fn production_requires_key_seeds() {
        let mut config = AppConfig::production();
        config.database.writer_url = "postgres://localhost/orgkeep".to_string();
        assert_eq!(config.validate(), Err(ConfigError::Missing("ORGKEEP_KEY")));

        config.security.key_seed = Some("k".to_string());
        config.security.signing_key_seed = Some("s".to_string());
        assert!(config.validate().is_ok());
        let keys = config.keys().unwrap();
        assert_eq!(keys.key.as_bytes(), Key::from_seed("k").as_bytes());
    }

    #[test]
    fn root_ids_come_in_pairs() {
        let mut config = AppConfig::development();
        config.root.org_id = Some("org".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
        config.root.user_id = Some("user".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_hides_seeds() {
        let mut config = AppConfig::development();
        config.security.key_seed = Some("super-secret-seed".to_string());
        assert!(!format!("{config:?}").contains("super-secret-seed"));
    }

    #[test]
    fn list_splitting() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
