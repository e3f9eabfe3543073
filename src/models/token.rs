use serde::{Deserialize, Serialize};

/// Stored token record as returned by `GET /api/token/{id}`.
///
/// Fields past `first_used_time` are read-only decorations the backend
/// computes on fetch; everything defaults so older backends still parse.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub remain_quota: i64,
    /// Epoch seconds, or -1 for "never expires".
    #[serde(default)]
    pub expired_time: i64,
    #[serde(default)]
    pub unlimited_quota: bool,
    /// Comma-joined model names; empty means unrestricted.
    #[serde(default)]
    pub model_limits: String,
    #[serde(default)]
    pub model_limits_enabled: bool,
    /// Newline-delimited IP allow-list; empty means unrestricted.
    #[serde(default)]
    pub allow_ips: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub start_on_first_use: bool,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub daily_quota_limit: i64,
    /// Epoch seconds of first consumption; 0 until the token is used.
    #[serde(default)]
    pub first_used_time: i64,

    #[serde(default)]
    pub expired_state: String,
    #[serde(default)]
    pub is_started: bool,
    #[serde(default)]
    pub is_never_expire: bool,
    #[serde(default)]
    pub remaining_seconds: i64,
    #[serde(default)]
    pub plan_duration_seconds: i64,
    #[serde(default)]
    pub daily_used_quota: i64,
    #[serde(default)]
    pub daily_remain_quota: i64,
}

/// Finalized submission body for `POST /api/token/` and `PUT /api/token/`.
/// Carries only the persisted schema: relative day/hour conveniences are
/// already folded into `duration_seconds` and `expired_time`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPayload {
    /// Present only on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub remain_quota: i64,
    pub expired_time: i64,
    pub unlimited_quota: bool,
    pub model_limits: String,
    pub model_limits_enabled: bool,
    pub allow_ips: String,
    pub group: String,
    pub start_on_first_use: bool,
    pub duration_seconds: i64,
    pub daily_quota_limit: i64,
    pub first_used_time: i64,
}

/// One page of the token list (`GET /api/token/?p=&size=`).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPage {
    #[serde(default)]
    pub items: Vec<TokenRecord>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}
