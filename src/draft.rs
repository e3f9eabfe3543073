use crate::config::ConsoleConfig;
use crate::models::token::TokenRecord;
use crate::services::expiry::{self, ExpiryField};
use crate::services::quota::QuotaScale;

/// Group value meaning "let the backend pick per request".
pub const AUTO_GROUP: &str = "auto";

/// The in-progress token record plus creation-only knobs.
///
/// `extend_days`/`extend_hours` exist only while editing and are folded into
/// the payload at save time; `token_count` only drives batch creation.
/// Neither ever reaches the persisted schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDraft {
    pub name: String,
    pub remain_quota: i64,
    pub unlimited_quota: bool,
    pub expired_time: ExpiryField,
    pub start_on_first_use: bool,
    pub duration_days: i64,
    pub duration_hours: i64,
    /// Per-day consumption cap; 0 means unlimited.
    pub daily_quota_limit: i64,
    /// Backend-owned; 0 until the token is first consumed.
    pub first_used_time: i64,
    pub extend_days: i64,
    pub extend_hours: i64,
    /// Empty means the account's own group.
    pub group: String,
    /// Ordered set of allowed model names; empty means unrestricted.
    pub model_limits: Vec<String>,
    pub allow_ips: String,
    pub token_count: u32,
}

impl TokenDraft {
    /// Fresh create-mode defaults: one currency unit of quota, no expiration.
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            name: String::new(),
            remain_quota: config.quota_per_unit,
            unlimited_quota: false,
            expired_time: ExpiryField::Never,
            start_on_first_use: false,
            duration_days: 0,
            duration_hours: 0,
            daily_quota_limit: 0,
            first_used_time: 0,
            extend_days: 0,
            extend_hours: 0,
            group: if config.default_use_auto_group {
                AUTO_GROUP.to_string()
            } else {
                String::new()
            },
            model_limits: Vec::new(),
            allow_ips: String::new(),
            token_count: 1,
        }
    }

    /// Normalize a fetched record into editable form: finite epochs become
    /// date-time strings, the joined model list becomes a set, and the stored
    /// duration is split back into day/hour inputs.
    pub fn hydrate(record: TokenRecord) -> Self {
        let (duration_days, duration_hours) = expiry::split_duration(record.duration_seconds);
        Self {
            name: record.name,
            remain_quota: record.remain_quota,
            unlimited_quota: record.unlimited_quota,
            expired_time: ExpiryField::from_epoch(record.expired_time),
            start_on_first_use: record.start_on_first_use,
            duration_days,
            duration_hours,
            daily_quota_limit: record.daily_quota_limit.max(0),
            first_used_time: record.first_used_time,
            extend_days: 0,
            extend_hours: 0,
            group: record.group,
            model_limits: split_model_limits(&record.model_limits),
            allow_ips: record.allow_ips,
            token_count: 1,
        }
    }

    /// Derived, never edited directly: restrictions are on iff the set is
    /// non-empty.
    pub fn model_limits_enabled(&self) -> bool {
        !self.model_limits.is_empty()
    }
}

fn split_model_limits(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// UI-only entry-mode toggles with their currency mirrors. The mirrors are
/// derivations of the integer quotas and are never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayModes {
    pub amount_mode: bool,
    pub amount_value: f64,
    pub daily_amount_mode: bool,
    pub daily_amount_value: f64,
}

/// Draft plus display modes, owned by exactly one form session. All
/// cross-field effects go through these transitions instead of a form handle.
#[derive(Debug, Clone)]
pub struct DraftStore {
    pub draft: TokenDraft,
    pub modes: DisplayModes,
    scale: QuotaScale,
}

impl DraftStore {
    pub fn new(config: &ConsoleConfig) -> Self {
        let draft = TokenDraft::new(config);
        let scale = QuotaScale::from_config(config);
        let mut store = Self {
            draft,
            modes: DisplayModes::default(),
            scale,
        };
        store.refresh_mirrors();
        store
    }

    /// Swap in a hydrated draft, re-deriving the currency mirrors.
    pub fn replace(&mut self, draft: TokenDraft) {
        self.draft = draft;
        self.refresh_mirrors();
    }

    pub fn scale(&self) -> QuotaScale {
        self.scale
    }

    fn refresh_mirrors(&mut self) {
        self.modes.amount_value = self.scale.to_currency(self.draft.remain_quota);
        self.modes.daily_amount_value = self.scale.to_currency(self.draft.daily_quota_limit);
    }

    /// Flip quota entry between raw units and currency. The current raw
    /// value is snapshotted into the mirror so the display does not jump.
    pub fn toggle_amount_mode(&mut self) {
        self.modes.amount_value = self.scale.to_currency(self.draft.remain_quota);
        self.modes.amount_mode = !self.modes.amount_mode;
    }

    pub fn toggle_daily_amount_mode(&mut self) {
        self.modes.daily_amount_value = self.scale.to_currency(self.draft.daily_quota_limit);
        self.modes.daily_amount_mode = !self.modes.daily_amount_mode;
    }

    /// Currency entered while in amount mode; invalid input keeps the prior
    /// quota.
    pub fn set_amount(&mut self, amount: f64) {
        if let Some(quota) = self.scale.to_quota(amount) {
            self.modes.amount_value = amount;
            self.draft.remain_quota = quota;
        }
    }

    pub fn set_daily_amount(&mut self, amount: f64) {
        if let Some(quota) = self.scale.to_quota(amount) {
            self.modes.daily_amount_value = amount;
            self.draft.daily_quota_limit = quota;
        }
    }

    /// Raw quota entered; the currency mirror follows.
    pub fn set_quota(&mut self, quota: i64) {
        self.draft.remain_quota = quota;
        self.modes.amount_value = self.scale.to_currency(quota);
    }

    pub fn set_daily_quota(&mut self, quota: i64) {
        self.draft.daily_quota_limit = quota;
        self.modes.daily_amount_value = self.scale.to_currency(quota);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::expiry::EXPIRY_NEVER;

    fn record() -> TokenRecord {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "ci-bot",
            "remain_quota": 750_000,
            "expired_time": 1_700_003_600i64,
            "unlimited_quota": false,
            "model_limits": "gpt-4o,claude-3",
            "model_limits_enabled": true,
            "allow_ips": "10.0.0.1",
            "group": "vip",
            "start_on_first_use": true,
            "duration_seconds": 90_000,
            "first_used_time": 0
        }))
        .unwrap()
    }

    #[test]
    fn defaults_start_at_one_currency_unit_and_never_expire() {
        let config = ConsoleConfig::new("http://localhost");
        let draft = TokenDraft::new(&config);
        assert_eq!(draft.remain_quota, config.quota_per_unit);
        assert_eq!(draft.expired_time, ExpiryField::Never);
        assert_eq!(draft.token_count, 1);
        assert!(draft.group.is_empty());
        assert!(!draft.model_limits_enabled());
    }

    #[test]
    fn auto_group_policy_seeds_the_default_group() {
        let mut config = ConsoleConfig::new("http://localhost");
        config.default_use_auto_group = true;
        assert_eq!(TokenDraft::new(&config).group, AUTO_GROUP);
    }

    #[test]
    fn hydration_normalizes_the_stored_record() {
        let draft = TokenDraft::hydrate(record());
        assert_eq!(draft.name, "ci-bot");
        assert_eq!(draft.duration_days, 1);
        assert_eq!(draft.duration_hours, 1);
        assert_eq!(draft.model_limits, vec!["gpt-4o", "claude-3"]);
        assert_eq!(draft.daily_quota_limit, 0);
        assert!(draft.expired_time.is_finite());
        match &draft.expired_time {
            ExpiryField::At(text) => {
                assert_eq!(expiry::parse_expiry(text).unwrap(), 1_700_003_600);
            }
            ExpiryField::Never => panic!("finite epoch must hydrate to a string"),
        }
    }

    #[test]
    fn hydration_keeps_the_never_sentinel() {
        let mut rec = record();
        rec.expired_time = EXPIRY_NEVER;
        assert_eq!(TokenDraft::hydrate(rec).expired_time, ExpiryField::Never);
    }

    #[test]
    fn empty_model_limits_hydrate_to_an_empty_set() {
        let mut rec = record();
        rec.model_limits = String::new();
        let draft = TokenDraft::hydrate(rec);
        assert!(draft.model_limits.is_empty());
        assert!(!draft.model_limits_enabled());
    }

    #[test]
    fn toggling_amount_mode_snapshots_the_current_quota() {
        let config = ConsoleConfig::new("http://localhost");
        let mut store = DraftStore::new(&config);
        store.set_quota(750_000);
        store.toggle_amount_mode();
        assert!(store.modes.amount_mode);
        assert_eq!(store.modes.amount_value, 1.5);
    }

    #[test]
    fn invalid_currency_input_leaves_the_quota_unchanged() {
        let config = ConsoleConfig::new("http://localhost");
        let mut store = DraftStore::new(&config);
        store.set_quota(500_000);
        store.set_amount(f64::NAN);
        assert_eq!(store.draft.remain_quota, 500_000);
        store.set_amount(2.0);
        assert_eq!(store.draft.remain_quota, 1_000_000);
    }

    #[test]
    fn daily_amount_entry_drives_the_daily_cap() {
        let config = ConsoleConfig::new("http://localhost");
        let mut store = DraftStore::new(&config);
        store.set_daily_amount(0.5);
        assert_eq!(store.draft.daily_quota_limit, 250_000);
        store.toggle_daily_amount_mode();
        assert_eq!(store.modes.daily_amount_value, 0.5);
    }
}
