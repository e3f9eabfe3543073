use crate::config::ConsoleConfig;

/// Quota units granted per 1 unit of display currency.
pub const DEFAULT_QUOTA_PER_UNIT: i64 = 500_000;
/// Decimal places shown in currency mode.
pub const DEFAULT_CURRENCY_DECIMALS: u32 = 2;

/// Bidirectional mapping between integer quota units and the display
/// currency. Persisted values are always integer quota; currency is a pure
/// display derivation.
#[derive(Debug, Clone, Copy)]
pub struct QuotaScale {
    quota_per_unit: i64,
    decimals: u32,
}

impl QuotaScale {
    pub fn new(quota_per_unit: i64, decimals: u32) -> Self {
        Self {
            quota_per_unit: quota_per_unit.max(1),
            decimals,
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config.quota_per_unit, config.currency_decimals)
    }

    /// Quota → currency, rounded to the configured display decimals.
    pub fn to_currency(&self, quota: i64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (quota as f64 / self.quota_per_unit as f64 * factor).round() / factor
    }

    /// Currency → quota, rounded to the nearest integer unit. Non-finite or
    /// negative amounts yield None; callers keep the previous quota.
    pub fn to_quota(&self, amount: f64) -> Option<i64> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        Some((amount * self.quota_per_unit as f64).round() as i64)
    }

    /// Quick-select amounts offered next to the quota field.
    pub fn presets(&self) -> Vec<(i64, String)> {
        [1, 10, 50, 100, 500, 1000]
            .into_iter()
            .map(|amount| (amount * self.quota_per_unit, format!("{amount}$")))
            .collect()
    }
}

impl Default for QuotaScale {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_PER_UNIT, DEFAULT_CURRENCY_DECIMALS)
    }
}
