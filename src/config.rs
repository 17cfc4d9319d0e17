//! Runtime configuration, read from the environment (and `.env` when present).

use actix_web::cookie::Key;
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::fmt;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 8;
const MIN_SESSION_KEY_LEN: usize = 64;
const MIN_PROVIDER_SECRET_LEN: usize = 32;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "{key} has invalid value '{value}'"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    /// Offset at which meeting date/time strings are interpreted.
    pub meeting_offset: FixedOffset,
    session_key: Option<String>,
    auth_provider_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v.parse::<u32>().ok().filter(|n| *n > 0).ok_or(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                value: v,
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        let meeting_offset = match env::var("MEETING_UTC_OFFSET_MINUTES") {
            Ok(v) => parse_offset_minutes(&v).ok_or(ConfigError::Invalid {
                key: "MEETING_UTC_OFFSET_MINUTES",
                value: v,
            })?,
            Err(_) => utc(),
        };

        let auth_provider_secret = match env::var("AUTH_PROVIDER_SECRET") {
            Ok(v) if v.len() >= MIN_PROVIDER_SECRET_LEN => Some(v),
            Ok(_) => {
                return Err(ConfigError::Invalid {
                    key: "AUTH_PROVIDER_SECRET",
                    value: format!("<{MIN_PROVIDER_SECRET_LEN}+ bytes required>"),
                });
            }
            Err(_) => {
                log::warn!("No AUTH_PROVIDER_SECRET set, sign-in is disabled");
                None
            }
        };

        Ok(AppConfig {
            database_url,
            bind_addr,
            max_connections,
            meeting_offset,
            session_key: env::var("SESSION_KEY").ok(),
            auth_provider_secret,
        })
    }

    /// Configuration for tests and tools that never read the environment.
    pub fn with_database_url(database_url: &str) -> Self {
        AppConfig {
            database_url: database_url.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            meeting_offset: utc(),
            session_key: None,
            auth_provider_secret: None,
        }
    }

    pub fn with_auth_provider_secret(mut self, secret: &str) -> Self {
        self.auth_provider_secret = Some(secret.to_string());
        self
    }

    /// Secret shared with the external auth provider's sign-in bridge.
    pub fn auth_provider_secret(&self) -> Option<&str> {
        self.auth_provider_secret.as_deref()
    }

    /// Cookie signing key. Sessions do not survive a restart unless `SESSION_KEY` is set.
    pub fn session_key(&self) -> Key {
        match &self.session_key {
            Some(val) if val.len() >= MIN_SESSION_KEY_LEN => {
                log::info!("Using SESSION_KEY from environment");
                Key::from(val.as_bytes())
            }
            Some(val) => {
                log::warn!(
                    "SESSION_KEY too short ({} bytes, need {}+), generating random key",
                    val.len(),
                    MIN_SESSION_KEY_LEN
                );
                Key::generate()
            }
            None => {
                log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
                Key::generate()
            }
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

fn parse_offset_minutes(value: &str) -> Option<FixedOffset> {
    let minutes: i32 = value.trim().parse().ok()?;
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_accepts_negative_minutes() {
        let off = parse_offset_minutes("-300").unwrap();
        assert_eq!(off.local_minus_utc(), -300 * 60);
    }

    #[test]
    fn offset_rejects_garbage_and_out_of_range() {
        assert!(parse_offset_minutes("five").is_none());
        assert!(parse_offset_minutes("100000").is_none());
    }

    #[test]
    fn fixed_config_defaults() {
        let cfg = AppConfig::with_database_url("postgres://localhost/roster");
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(cfg.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(cfg.meeting_offset.local_minus_utc(), 0);
        assert!(cfg.auth_provider_secret().is_none());
    }
}
