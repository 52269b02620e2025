use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_AWS_REGION: &str = "us-west-2";
pub const DEFAULT_PROVIDER: &str = "aws";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("unknown cost provider {0:?} (expected one of: {1})")]
    UnknownProvider(String, String),
}

/// Operating mode. Production hides error details from HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    Debug,
    Production,
}

impl AppMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "dev" | "development" => Some(AppMode::Debug),
            "production" | "prod" | "release" => Some(AppMode::Production),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, AppMode::Production)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub aws_region: String,
    pub provider: String,
    pub mode: AppMode,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
}

impl Settings {
    /// Read settings from the process environment (call `dotenv` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Settings::from_env`] with an injectable variable lookup.
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                var: "BIND_ADDR",
                value: bind_addr_raw.clone(),
                reason: e.to_string(),
            })?;

        let mode = match get("APP_MODE") {
            None => AppMode::Debug,
            Some(raw) => AppMode::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                var: "APP_MODE",
                value: raw.clone(),
                reason: "expected debug or production".to_string(),
            })?,
        };

        Ok(Self {
            bind_addr,
            aws_region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            provider: get("COST_PROVIDER")
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
                .to_ascii_lowercase(),
            mode,
            cache_ttl: seconds(&get, "CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
            upstream_timeout: seconds(&get, "UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS)?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            aws_region: DEFAULT_AWS_REGION.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            mode: AppMode::Debug,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

fn seconds(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = get(var) else {
        return Ok(Duration::from_secs(default));
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            var,
            value: raw,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
