//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 480;

/// Development-only signing secret, used when `JWT_SECRET` is unset.
pub const DEV_JWT_SECRET: &str = "aula-dev-secret-change-me";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BIND_ADDR '{0}' is not a socket address")]
    InvalidBindAddr(String),

    #[error("TOKEN_TTL_MINUTES '{0}' must be a positive integer")]
    InvalidTokenTtl(String),

    #[error("JWT_SECRET must not be empty")]
    EmptyJwtSecret,

    #[error("ADMIN_EMAIL and ADMIN_PASSWORD must be set together")]
    IncompleteAdmin,
}

/// Credentials for the administrator created at startup when none exists.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Postgres when set, in-memory storage otherwise.
    pub database_url: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw.clone()))?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if secret.is_empty() => return Err(ConfigError::EmptyJwtSecret),
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let token_ttl = match get("TOKEN_TTL_MINUTES") {
            None => chrono::Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if minutes > 0 => chrono::Duration::minutes(minutes),
                _ => return Err(ConfigError::InvalidTokenTtl(raw)),
            },
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteAdmin),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            database_url: get("DATABASE_URL"),
            admin,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.uses_dev_secret());
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(480));
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.admin, None);
    }

    #[test]
    fn explicit_values() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_MINUTES", "15"),
            ("DATABASE_URL", "postgres://localhost/aula"),
            ("ADMIN_EMAIL", "root@aula.test"),
            ("ADMIN_PASSWORD", "changeme123"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert!(!cfg.uses_dev_secret());
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(15));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/aula"));
        assert_eq!(cfg.admin.as_ref().map(|a| a.email.as_str()), Some("root@aula.test"));
        assert!(!format!("{:?}", cfg.admin).contains("changeme123"));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert_eq!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::InvalidBindAddr("nowhere".into()))
        );
        assert_eq!(
            config(&[("TOKEN_TTL_MINUTES", "0")]),
            Err(ConfigError::InvalidTokenTtl("0".into()))
        );
        assert_eq!(config(&[("JWT_SECRET", "")]), Err(ConfigError::EmptyJwtSecret));
        assert_eq!(config(&[("ADMIN_EMAIL", "a@b.c")]), Err(ConfigError::IncompleteAdmin));
    }
}
