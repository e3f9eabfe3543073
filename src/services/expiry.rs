use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::error::ConsoleError;

/// Sentinel meaning "no expiration". Distinct from an unset (zero) timestamp.
pub const EXPIRY_NEVER: i64 = -1;

/// Format of the editable date-time string.
const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;

/// The editable expiration field: the "never" sentinel or a date-time string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryField {
    Never,
    At(String),
}

impl ExpiryField {
    /// Normalize a stored epoch for editing; the sentinel stays the sentinel.
    pub fn from_epoch(epoch: i64) -> Self {
        if epoch == EXPIRY_NEVER {
            ExpiryField::Never
        } else {
            ExpiryField::At(format_expiry(epoch))
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, ExpiryField::Never)
    }

    /// Whether the field holds a usable finite value.
    pub fn is_finite(&self) -> bool {
        matches!(self, ExpiryField::At(text) if !text.trim().is_empty())
    }
}

/// Expiration for a quick-select preset: now + the given window, with a
/// fixed 30-day month. A zero-length window selects "never", not "now".
pub fn preset_expiry(
    now: DateTime<Utc>,
    months: i64,
    days: i64,
    hours: i64,
    minutes: i64,
) -> ExpiryField {
    let seconds =
        months * 30 * SECS_PER_DAY + days * SECS_PER_DAY + hours * SECS_PER_HOUR + minutes * 60;
    if seconds == 0 {
        ExpiryField::Never
    } else {
        ExpiryField::At(format_expiry(now.timestamp() + seconds))
    }
}

/// Render an epoch as the editable local date-time string.
pub fn format_expiry(epoch: i64) -> String {
    Local
        .timestamp_opt(epoch, 0)
        .earliest()
        .map(|dt| dt.format(EXPIRY_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parse an editable date-time string back to epoch seconds, rounding any
/// sub-second part up. Accepts the local editable format or RFC 3339.
/// An unparseable string is a validation failure, never coerced.
pub fn parse_expiry(text: &str) -> Result<i64, ConsoleError> {
    let trimmed = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, EXPIRY_FORMAT) {
        let resolved = Local.from_local_datetime(&naive).earliest().ok_or_else(|| {
            ConsoleError::Validation(format!("invalid expiration time: {trimmed}"))
        })?;
        return Ok(ceil_seconds(resolved.timestamp_millis()));
    }
    if let Ok(fixed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ceil_seconds(fixed.timestamp_millis()));
    }
    Err(ConsoleError::Validation(format!(
        "invalid expiration time: {trimmed}"
    )))
}

fn ceil_seconds(millis: i64) -> i64 {
    let quotient = millis / 1000;
    let remainder = millis % 1000;
    if remainder > 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// A finite expiration must be strictly later than now.
pub fn ensure_future(epoch: i64, now: DateTime<Utc>) -> Result<(), ConsoleError> {
    if epoch <= now.timestamp() {
        return Err(ConsoleError::Validation(
            "expiration time must be later than the current time".into(),
        ));
    }
    Ok(())
}

/// Combine day/hour inputs into seconds.
pub fn duration_seconds(days: i64, hours: i64) -> i64 {
    (days * 24 + hours) * SECS_PER_HOUR
}

/// Reconstruct the (days, hours) pair from a stored duration, flooring.
pub fn split_duration(seconds: i64) -> (i64, i64) {
    if seconds <= 0 {
        return (0, 0);
    }
    (seconds / SECS_PER_DAY, (seconds % SECS_PER_DAY) / SECS_PER_HOUR)
}

/// Remaining (days, hours) until expiration, floored and clamped to zero.
/// Display only; never feeds back into persisted state.
pub fn remaining_window(now: DateTime<Utc>, expiry_epoch: i64) -> (i64, i64) {
    let secs = (expiry_epoch - now.timestamp()).max(0);
    (secs / SECS_PER_DAY, (secs % SECS_PER_DAY) / SECS_PER_HOUR)
}
