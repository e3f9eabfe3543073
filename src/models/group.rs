use serde::Deserialize;

/// Per-group metadata from `GET /api/user/self/groups`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupInfo {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub ratio: f64,
}

/// A selectable group, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOption {
    pub value: String,
    pub label: String,
    /// Billing ratio for the group; None for the synthesized "auto" entry.
    pub ratio: Option<f64>,
}
