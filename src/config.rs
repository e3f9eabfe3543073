use std::env;

use crate::services::quota::{DEFAULT_CURRENCY_DECIMALS, DEFAULT_QUOTA_PER_UNIT};

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the gateway backend, e.g. "https://gateway.example.com".
    pub base_url: String,
    /// Session credential sent as a Cookie header; None for cookie-less setups.
    pub session_cookie: Option<String>,
    /// Integer quota units per 1 unit of display currency.
    pub quota_per_unit: i64,
    /// Decimal places shown when a field is in currency mode.
    pub currency_decimals: u32,
    /// Whether new drafts default to the "auto" group.
    pub default_use_auto_group: bool,
    /// Per-request timeout in seconds, so a hung backend cannot leave the
    /// form loading forever.
    pub request_timeout_secs: u64,
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

impl ConsoleConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file (ignore if missing)
        dotenvy::dotenv().ok();

        Ok(Self {
            base_url: env::var("TOKEN_API_BASE_URL")
                .map_err(|_| anyhow::anyhow!("TOKEN_API_BASE_URL is required"))?,
            session_cookie: env::var("TOKEN_SESSION_COOKIE").ok(),
            quota_per_unit: env::var("TOKEN_QUOTA_PER_UNIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_QUOTA_PER_UNIT),
            currency_decimals: env::var("TOKEN_CURRENCY_DECIMALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CURRENCY_DECIMALS),
            default_use_auto_group: parse_bool_env("TOKEN_DEFAULT_AUTO_GROUP", false),
            request_timeout_secs: env::var("TOKEN_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Programmatic construction with defaults, for embedding and tests.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_cookie: None,
            quota_per_unit: DEFAULT_QUOTA_PER_UNIT,
            currency_decimals: DEFAULT_CURRENCY_DECIMALS,
            default_use_auto_group: false,
            request_timeout_secs: 30,
        }
    }
}
