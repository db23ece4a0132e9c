use std::env;
use std::net::SocketAddr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Duration, FixedOffset};
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub qr_encryption_key: [u8; 32],
    pub auth_token_secret: Vec<u8>,
    pub auth_token_ttl: Duration,
    pub webhook_secret: Vec<u8>,
    pub pending_purchase_ttl: Duration,
    pub duplicate_purchase_window: Duration,
    pub expiry_sweep_interval: std::time::Duration,
    pub venue_utc_offset: FixedOffset,
    pub login_max_attempts: u32,
    pub login_lockout: Duration,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub cors_allowed_origins: Option<String>,
    /// Honour `X-Forwarded-For`/`X-Real-IP`. Only enable behind a proxy that
    /// overwrites them.
    pub trust_proxy_headers: bool,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e| ConfigError::Invalid {
            name: "BIND_ADDR",
            reason: format!("{e}"),
        })?;

        let qr_encryption_key = decode_key(
            &get("QR_ENCRYPTION_KEY").ok_or(ConfigError::Missing("QR_ENCRYPTION_KEY"))?,
        )?;

        let auth_token_secret = secret(&get, "AUTH_TOKEN_SECRET")?;
        let webhook_secret = secret(&get, "WEBHOOK_SECRET")?;

        let offset_minutes: i32 = number(&get, "VENUE_UTC_OFFSET_MINUTES", -180)?;
        let venue_utc_offset =
            FixedOffset::east_opt(offset_minutes * 60).ok_or(ConfigError::Invalid {
                name: "VENUE_UTC_OFFSET_MINUTES",
                reason: "offset out of range".to_string(),
            })?;

        let smtp = match get("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                username: get("SMTP_USERNAME").unwrap_or_default(),
                password: get("SMTP_PASSWORD").unwrap_or_default(),
            }),
            None => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections: number(&get, "DB_MAX_CONNECTIONS", 5)?,
            qr_encryption_key,
            auth_token_secret,
            auth_token_ttl: Duration::minutes(number(&get, "AUTH_TOKEN_TTL_MINUTES", 720)?),
            webhook_secret,
            pending_purchase_ttl: Duration::minutes(number(
                &get,
                "PENDING_PURCHASE_TTL_MINUTES",
                60,
            )?),
            duplicate_purchase_window: Duration::seconds(number(
                &get,
                "DUPLICATE_PURCHASE_WINDOW_SECONDS",
                120,
            )?),
            expiry_sweep_interval: std::time::Duration::from_secs(number(
                &get,
                "EXPIRY_SWEEP_INTERVAL_SECONDS",
                300,
            )?),
            venue_utc_offset,
            login_max_attempts: number(&get, "LOGIN_MAX_ATTEMPTS", 5)?,
            login_lockout: Duration::minutes(number(&get, "LOGIN_LOCKOUT_MINUTES", 15)?),
            smtp,
            mail_from: get("MAIL_FROM").unwrap_or_else(|| "no-reply@termas.local".to_string()),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
            trust_proxy_headers: number(&get, "TRUST_PROXY_HEADERS", false)?,
            production: get("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
        })
    }
}

fn secret<G>(get: &G, name: &'static str) -> Result<Vec<u8>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = get(name).ok_or(ConfigError::Missing(name))?;
    if value.len() < 16 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be at least 16 characters".to_string(),
        });
    }
    Ok(value.into_bytes())
}

fn number<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn decode_key(raw: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|e| ConfigError::Invalid {
            name: "QR_ENCRYPTION_KEY",
            reason: e.to_string(),
        })?;

    bytes.try_into().map_err(|b: Vec<u8>| ConfigError::Invalid {
        name: "QR_ENCRYPTION_KEY",
        reason: format!("expected 32 bytes, got {}", b.len()),
    })
}
