//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Base URLs of the collaborator services.
///
/// Any URL left unset falls back to an in-memory collaborator, except SMS
/// which is simply disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceUrls {
    pub user: Option<String>,
    pub restaurant: Option<String>,
    pub table: Option<String>,
    pub cart: Option<String>,
    pub notification: Option<String>,
    pub sms: Option<String>,
}

impl ServiceUrls {
    /// Returns true when every required collaborator has a URL.
    pub fn is_complete(&self) -> bool {
        self.user.is_some()
            && self.restaurant.is_some()
            && self.table.is_some()
            && self.cart.is_some()
            && self.notification.is_some()
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: Postgres connection string (unset: in-memory store)
/// - `INTERNAL_API_KEY`: sent to collaborators as `x-service-key`
/// - `COLLABORATOR_TIMEOUT_MS`: per-call timeout (default: `3000`)
/// - `USER_SERVICE_URL`, `RESTAURANT_SERVICE_URL`, `TABLE_SERVICE_URL`,
///   `CART_SERVICE_URL`, `NOTIFICATION_SERVICE_URL`, `SMS_SERVICE_URL`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub internal_api_key: Option<String>,
    pub collaborator_timeout: Duration,
    pub services: ServiceUrls,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database_url: var("DATABASE_URL"),
            internal_api_key: var("INTERNAL_API_KEY"),
            collaborator_timeout: var("COLLABORATOR_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.collaborator_timeout),
            services: ServiceUrls {
                user: var("USER_SERVICE_URL"),
                restaurant: var("RESTAURANT_SERVICE_URL"),
                table: var("TABLE_SERVICE_URL"),
                cart: var("CART_SERVICE_URL"),
                notification: var("NOTIFICATION_SERVICE_URL"),
                sms: var("SMS_SERVICE_URL"),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            internal_api_key: None,
            collaborator_timeout: saga::DEFAULT_TIMEOUT,
            services: ServiceUrls::default(),
        }
    }
}
