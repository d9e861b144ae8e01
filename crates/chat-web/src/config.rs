//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chat_core::ActionLinks;
use database::{PoolSettings, RetryPolicy, StoreConfig};

/// Chat server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Backend selection settings.
    pub store: StoreConfig,
    /// Emails allowed to open a chat session, lowercased.
    pub authorized_emails: Vec<String>,
    /// Bearer token for the admin log routes. Unset disables them.
    pub admin_token: Option<String>,
    /// Shop URLs for follow-up actions under replies.
    pub action_links: ActionLinks,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CHAT_ADDR` | Server bind address | `127.0.0.1:3001` |
    /// | `DATABASE_URL` | PostgreSQL connection string | (SQLite) |
    /// | `DATA_DIR` | Directory holding `chatbot.db` | `data` |
    /// | `AUTHORIZED_EMAILS` | Comma-separated login allowlist | `admin@example.com` |
    /// | `ADMIN_TOKEN` | Bearer token for `/api/logs/*` admin routes | (disabled) |
    /// | `STORE_RETRY_ATTEMPTS` | Extra attempts for failed store calls | `0` |
    /// | `STORE_RETRY_BACKOFF_MS` | Delay before the first retry | `100` |
    /// | `CATERING_URL` | "View Catering Options" link | (no action) |
    /// | `CATERING_FORM_URL` | "Request Catering Quote" form | (no action) |
    /// | `ORDER_URL` | "Order Online" link | (no action) |
    /// | `DIRECTIONS_URL` | "Get Directions" link | (no action) |
    /// | `MENU_URL` | "View Full Menu" link | (no action) |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = lookup("CHAT_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3001".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        let authorized_emails = lookup("AUTHORIZED_EMAILS")
            .unwrap_or_else(|| "admin@example.com".to_string())
            .split(',')
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();

        let admin_token = lookup("ADMIN_TOKEN").filter(|token| !token.trim().is_empty());

        let retry = RetryPolicy {
            max_retries: parse_number(&lookup, "STORE_RETRY_ATTEMPTS", 0)?,
            base_delay: Duration::from_millis(parse_number(&lookup, "STORE_RETRY_BACKOFF_MS", 100)?),
        };

        let url = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let action_links = ActionLinks {
            catering: url("CATERING_URL"),
            catering_form: url("CATERING_FORM_URL"),
            order: url("ORDER_URL"),
            directions: url("DIRECTIONS_URL"),
            menu: url("MENU_URL"),
        };

        Ok(Self {
            addr,
            store: StoreConfig {
                database_url,
                data_dir,
                pool: PoolSettings::default(),
                retry,
            },
            authorized_emails,
            admin_token,
            action_links,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key)),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CHAT_ADDR format")]
    InvalidAddr,

    #[error("{0} must be a non-negative integer")]
    InvalidNumber(&'static str),
}
