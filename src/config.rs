use std::fmt;
use std::time::Duration;

use crate::errors::AppError;

/// Connection settings for the Permify HTTP API.
#[derive(Clone)]
pub struct PermifyConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request timeout for unary calls. Watch streams are never bounded by it.
    pub request_timeout: Option<Duration>,
    pub skip_health_check: bool,
}

impl PermifyConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            request_timeout: None,
            skip_health_check: false,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn skip_health_check(mut self, skip: bool) -> Self {
        self.skip_health_check = skip;
        self
    }

    pub fn from_env() -> Result<Self, AppError> {
        let base_url = std::env::var("PERMIFY_BASE_URL")
            .map_err(|_| AppError::configuration("PERMIFY_BASE_URL not set"))?;
        if base_url.trim().is_empty() {
            return Err(AppError::configuration("PERMIFY_BASE_URL must not be empty"));
        }

        let api_key = std::env::var("PERMIFY_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let request_timeout = match std::env::var("PERMIFY_TIMEOUT_SECS") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| AppError::configuration("PERMIFY_TIMEOUT_SECS must be a valid integer"))?,
            ),
            Err(_) => None,
        };

        let skip_health_check = match std::env::var("PERMIFY_SKIP_HEALTH_CHECK") {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                AppError::configuration("PERMIFY_SKIP_HEALTH_CHECK must be true/false")
            })?,
            Err(_) => false,
        };

        Ok(Self {
            base_url,
            api_key,
            request_timeout,
            skip_health_check,
        })
    }
}

impl fmt::Debug for PermifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermifyConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("skip_health_check", &self.skip_health_check)
            .finish()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}
