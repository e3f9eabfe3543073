use serde::Deserialize;

/// Response wrapper used by every backend endpoint. `success=false` always
/// carries a human-readable `message`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}
