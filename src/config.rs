// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use dotenvy::dotenv;
use thiserror::Error;

use crate::session::anticheat::MonitorConfig;

/// Length of a quiz join code.
pub const QUIZ_CODE_LEN: usize = 6;

/// Visibility losses tolerated before an attempt is force-submitted.
pub const DEFAULT_TAB_SWITCH_LIMIT: u32 = 3;

/// Delay between reaching the tab-switch limit and the forced submit.
pub const DEFAULT_FORCED_SUBMIT_GRACE_SECS: u64 = 2;

/// Attempts at finding an unused quiz code before giving up.
pub const QUIZ_CODE_ATTEMPTS: usize = 5;

/// How long a finished attempt stays in memory for result and event polling.
pub const DEFAULT_SESSION_RETENTION_SECS: u64 = 600;

/// Period of the sweep that evicts finished attempts.
pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL. Without it the server runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub tab_switch_limit: u32,
    pub forced_submit_grace_secs: u64,
    pub session_retention_secs: u64,
    pub creator_username: Option<String>,
    pub creator_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", 86400)?,
            rust_log,
            bind_addr: parse_var("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            tab_switch_limit: parse_var("TAB_SWITCH_LIMIT", DEFAULT_TAB_SWITCH_LIMIT)?,
            forced_submit_grace_secs: parse_var(
                "FORCED_SUBMIT_GRACE_SECS",
                DEFAULT_FORCED_SUBMIT_GRACE_SECS,
            )?,
            session_retention_secs: parse_var(
                "SESSION_RETENTION_SECS",
                DEFAULT_SESSION_RETENTION_SECS,
            )?,
            creator_username: env::var("CREATOR_USERNAME").ok(),
            creator_password: env::var("CREATOR_PASSWORD").ok(),
        })
    }

    pub fn monitor(&self) -> MonitorConfig {
        MonitorConfig {
            tab_switch_limit: self.tab_switch_limit,
            grace: Duration::from_secs(self.forced_submit_grace_secs),
        }
    }

    pub fn session_retention(&self) -> Duration {
        Duration::from_secs(self.session_retention_secs)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}
