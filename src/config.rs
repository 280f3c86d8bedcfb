use serde::Serialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_NAME: &str = "user_registry";
const DEFAULT_USERS_COLLECTION: &str = "users";
const DEFAULT_HEALTH_COLLECTION: &str = "healthchecks";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30 * 60;
const DEFAULT_HEALTH_PROBE_TIMEOUT_SECS: u64 = 15;

/// Upper bound on a single store call when `STORE_TIMEOUT_SECS` is unset.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set to a MongoDB connection string")]
    MissingConnectionString(&'static str),
    #[error("{name} has an invalid value `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

/// Deployment environment, read from `APP_ENV`.
///
/// Only `Development` exposes internal error details in HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub users_collection: String,
    pub health_collection: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
    /// Key clients on `Forwarded` / `X-Forwarded-For` instead of the socket
    /// peer. Only safe behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            trust_proxy: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthConfig {
    pub interval: Duration,
    pub probe_timeout: Duration,
}

/// # Application Configuration
///
/// Everything the service needs at startup, read from the process
/// environment (after `.env` has been loaded by `main`).
///
/// ## Variables
/// - `MONGODB_URI` (required)
/// - `HOST`, `PORT`
/// - `APP_ENV`
/// - `DB_NAME`, `DB_USERS_COLLECTION`, `DB_HEALTH_COLLECTION`
/// - `STORE_TIMEOUT_SECS`
/// - `RATE_LIMIT_MAX_REQUESTS`, `RATE_LIMIT_WINDOW_SECS`, `RATE_LIMIT_TRUST_PROXY`
/// - `HEALTH_CHECK_INTERVAL_SECS`, `HEALTH_PROBE_TIMEOUT_SECS`
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
    pub health: HealthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = lookup("MONGODB_URI")
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(ConfigError::MissingConnectionString("MONGODB_URI"))?;

        let environment = match lookup("APP_ENV") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "APP_ENV",
                value: raw,
            })?,
            None => Environment::Development,
        };

        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: text("HOST", DEFAULT_HOST),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            environment,
            store: StoreConfig {
                uri,
                database: text("DB_NAME", DEFAULT_DB_NAME),
                users_collection: text("DB_USERS_COLLECTION", DEFAULT_USERS_COLLECTION),
                health_collection: text("DB_HEALTH_COLLECTION", DEFAULT_HEALTH_COLLECTION),
                timeout: secs_or(&lookup, "STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT_SECS)?,
            },
            rate_limit: RateLimitConfig {
                max_requests: parse_or(
                    &lookup,
                    "RATE_LIMIT_MAX_REQUESTS",
                    DEFAULT_RATE_LIMIT_MAX_REQUESTS,
                )?,
                window: secs_or(&lookup, "RATE_LIMIT_WINDOW_SECS", DEFAULT_RATE_LIMIT_WINDOW_SECS)?,
                trust_proxy: parse_or(&lookup, "RATE_LIMIT_TRUST_PROXY", false)?,
            },
            health: HealthConfig {
                interval: secs_or(
                    &lookup,
                    "HEALTH_CHECK_INTERVAL_SECS",
                    DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
                )?,
                probe_timeout: secs_or(
                    &lookup,
                    "HEALTH_PROBE_TIMEOUT_SECS",
                    DEFAULT_HEALTH_PROBE_TIMEOUT_SECS,
                )?,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        None => Ok(default),
    }
}

// Zero-length durations would make tokio intervals panic.
fn secs_or<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, name, default)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
