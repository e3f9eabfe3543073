use chrono::{DateTime, Utc};
use rand::Rng;

use crate::draft::TokenDraft;
use crate::error::ConsoleError;
use crate::models::token::TokenPayload;
use crate::services::expiry::{self, ExpiryField, EXPIRY_NEVER};

/// Longest name the backend accepts.
pub const MAX_NAME_LEN: usize = 30;

const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// How a payload is being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Edit { id: i64 },
}

impl SubmitMode {
    fn is_create(self) -> bool {
        matches!(self, SubmitMode::Create)
    }
}

/// Assemble the wire payload from a draft. Pure except for the injected
/// `now`. A validation failure aborts with no partial effect on the draft.
pub fn build_payload(
    draft: &TokenDraft,
    mode: SubmitMode,
    now: DateTime<Utc>,
) -> Result<TokenPayload, ConsoleError> {
    let name = draft.name.trim();
    if name.is_empty() && !mode.is_create() {
        return Err(ConsoleError::Validation("token name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ConsoleError::Validation(format!(
            "token name exceeds {MAX_NAME_LEN} characters"
        )));
    }

    let extend_seconds = expiry::duration_seconds(draft.extend_days, draft.extend_hours);
    let mut duration_seconds = expiry::duration_seconds(draft.duration_days, draft.duration_hours);

    // A deferred token that has not started counting yet submits the
    // sentinel; the backend computes the real expiration at first use.
    let not_started =
        draft.start_on_first_use && (mode.is_create() || draft.first_used_time <= 0);
    let mut field = draft.expired_time.clone();
    if not_started && !field.is_finite() {
        field = ExpiryField::Never;
    }

    let mut expired_time = match &field {
        ExpiryField::Never => EXPIRY_NEVER,
        ExpiryField::At(text) => {
            let epoch = expiry::parse_expiry(text)?;
            if !not_started {
                expiry::ensure_future(epoch, now)?;
            }
            epoch
        }
    };

    if extend_seconds > 0 {
        if not_started {
            duration_seconds += extend_seconds;
        } else if expired_time != EXPIRY_NEVER {
            expired_time += extend_seconds;
        }
    }

    Ok(TokenPayload {
        id: match mode {
            SubmitMode::Edit { id } => Some(id),
            SubmitMode::Create => None,
        },
        name: name.to_string(),
        remain_quota: draft.remain_quota,
        expired_time,
        unlimited_quota: draft.unlimited_quota,
        model_limits: draft.model_limits.join(","),
        model_limits_enabled: draft.model_limits_enabled(),
        allow_ips: draft.allow_ips.clone(),
        group: draft.group.clone(),
        start_on_first_use: draft.start_on_first_use,
        duration_seconds,
        daily_quota_limit: draft.daily_quota_limit.max(0),
        first_used_time: draft.first_used_time,
    })
}

/// Per-unit display name for batch creation: the first unit keeps the base
/// name when one was given, every other unit gets a random suffix.
pub fn batch_name(base: &str, index: usize) -> String {
    let trimmed = base.trim();
    if index == 0 && !trimmed.is_empty() {
        return trimmed.to_string();
    }
    let base = if trimmed.is_empty() { "default" } else { trimmed };
    format!("{base}-{}", random_suffix())
}

/// 6 random alphanumeric characters. Display-name disambiguation only; this
/// source is not collision resistant.
pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::config::ConsoleConfig;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn base_draft() -> TokenDraft {
        let mut draft = TokenDraft::new(&ConsoleConfig::new("http://localhost"));
        draft.name = "worker".into();
        draft
    }

    #[test]
    fn duration_inputs_fold_into_seconds() {
        for (days, hours) in [(0, 0), (0, 5), (2, 0), (3, 7), (30, 23)] {
            let mut draft = base_draft();
            draft.duration_days = days;
            draft.duration_hours = hours;
            let payload = build_payload(&draft, SubmitMode::Create, fixed_now()).unwrap();
            assert_eq!(payload.duration_seconds, (days * 24 + hours) * 3600);
        }
    }

    #[test]
    fn payload_never_carries_convenience_fields() {
        let mut draft = base_draft();
        draft.extend_days = 1;
        draft.duration_days = 2;
        let payload = build_payload(&draft, SubmitMode::Create, fixed_now()).unwrap();
        let wire = serde_json::to_value(&payload).unwrap();
        for key in [
            "duration_days",
            "duration_hours",
            "extend_days",
            "extend_hours",
            "token_count",
            "id",
        ] {
            assert!(wire.get(key).is_none(), "unexpected wire field {key}");
        }
    }

    #[test]
    fn edit_mode_splices_the_record_id() {
        let payload =
            build_payload(&base_draft(), SubmitMode::Edit { id: 42 }, fixed_now()).unwrap();
        assert_eq!(payload.id, Some(42));
        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["id"], 42);
    }

    #[test]
    fn deferred_unused_tokens_submit_the_sentinel() {
        let mut draft = base_draft();
        draft.start_on_first_use = true;
        let payload = build_payload(&draft, SubmitMode::Create, fixed_now()).unwrap();
        assert_eq!(payload.expired_time, EXPIRY_NEVER);
        assert!(payload.start_on_first_use);
    }

    #[test]
    fn extend_grows_the_duration_while_deferred() {
        // edit mode, never used: the extension lands on the duration and the
        // sentinel stays untouched
        let mut draft = base_draft();
        draft.start_on_first_use = true;
        draft.first_used_time = 0;
        draft.duration_days = 1;
        draft.extend_days = 2;
        let payload = build_payload(&draft, SubmitMode::Edit { id: 7 }, fixed_now()).unwrap();
        assert_eq!(payload.duration_seconds, 3 * 24 * 3600);
        assert_eq!(payload.expired_time, EXPIRY_NEVER);
    }

    #[test]
    fn extend_shifts_a_finite_expiration() {
        let now = fixed_now();
        let expiry_epoch = now.timestamp() + 7 * 24 * 3600;
        let mut draft = base_draft();
        draft.expired_time = ExpiryField::At(expiry::format_expiry(expiry_epoch));
        draft.extend_hours = 5;
        let payload = build_payload(&draft, SubmitMode::Edit { id: 7 }, now).unwrap();
        assert_eq!(payload.expired_time, expiry_epoch + 5 * 3600);
        assert_eq!(payload.duration_seconds, 0);
    }

    #[test]
    fn extend_does_not_touch_the_never_sentinel() {
        let mut draft = base_draft();
        draft.extend_hours = 5;
        let payload = build_payload(&draft, SubmitMode::Edit { id: 7 }, fixed_now()).unwrap();
        assert_eq!(payload.expired_time, EXPIRY_NEVER);
        assert_eq!(payload.duration_seconds, 0);
    }

    #[test]
    fn started_deferred_tokens_extend_their_expiration() {
        let now = fixed_now();
        let expiry_epoch = now.timestamp() + 24 * 3600;
        let mut draft = base_draft();
        draft.start_on_first_use = true;
        draft.first_used_time = now.timestamp() - 3600;
        draft.expired_time = ExpiryField::At(expiry::format_expiry(expiry_epoch));
        draft.extend_hours = 2;
        let payload = build_payload(&draft, SubmitMode::Edit { id: 7 }, now).unwrap();
        assert_eq!(payload.expired_time, expiry_epoch + 2 * 3600);
    }

    #[test]
    fn unparseable_expiration_aborts_the_build() {
        let mut draft = base_draft();
        draft.expired_time = ExpiryField::At("soon-ish".into());
        let err = build_payload(&draft, SubmitMode::Edit { id: 7 }, fixed_now()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn expiration_at_now_is_rejected() {
        let now = fixed_now();
        let mut draft = base_draft();
        draft.expired_time = ExpiryField::At(expiry::format_expiry(now.timestamp()));
        assert!(build_payload(&draft, SubmitMode::Create, now).is_err());
    }

    #[test]
    fn past_expirations_are_allowed_while_deferred_and_unused() {
        // hidden field: the stored value passes through for the backend
        let now = fixed_now();
        let mut draft = base_draft();
        draft.start_on_first_use = true;
        draft.expired_time = ExpiryField::At(expiry::format_expiry(now.timestamp() - 3600));
        assert!(build_payload(&draft, SubmitMode::Edit { id: 7 }, now).is_ok());
    }

    #[test]
    fn model_limits_join_and_derive_the_flag() {
        let mut draft = base_draft();
        draft.model_limits = vec!["gpt-4o".into(), "claude-3".into()];
        let payload = build_payload(&draft, SubmitMode::Create, fixed_now()).unwrap();
        assert_eq!(payload.model_limits, "gpt-4o,claude-3");
        assert!(payload.model_limits_enabled);

        draft.model_limits.clear();
        let payload = build_payload(&draft, SubmitMode::Create, fixed_now()).unwrap();
        assert_eq!(payload.model_limits, "");
        assert!(!payload.model_limits_enabled);
    }

    #[test]
    fn edit_requires_a_name() {
        let mut draft = base_draft();
        draft.name = "   ".into();
        assert!(build_payload(&draft, SubmitMode::Edit { id: 7 }, fixed_now()).is_err());
    }

    #[test]
    fn overlong_names_are_rejected() {
        let mut draft = base_draft();
        draft.name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(build_payload(&draft, SubmitMode::Create, fixed_now()).is_err());
    }

    #[test]
    fn batch_names_keep_the_base_then_suffix() {
        assert_eq!(batch_name("batch", 0), "batch");
        for index in 1..4 {
            let name = batch_name("batch", index);
            let suffix = name.strip_prefix("batch-").expect("suffixed name");
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn empty_base_names_fall_back_to_default() {
        for index in 0..2 {
            let name = batch_name("  ", index);
            assert!(name.starts_with("default-"), "got {name}");
        }
    }
}
