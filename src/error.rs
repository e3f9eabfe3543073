/// Errors surfaced by the token console. Each one terminates only the
/// operation that raised it; the form session stays usable.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// A read from the backend failed, either in transport or with a
    /// `success=false` envelope. Carries the message to show the user.
    #[error("{0}")]
    Fetch(String),

    /// Locally detected bad input. Nothing was sent to the backend.
    #[error("{0}")]
    Validation(String),

    /// A create or update was rejected by the backend. The draft is kept so
    /// the user can correct and resubmit.
    #[error("{0}")]
    Submit(String),
}

impl ConsoleError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ConsoleError::Validation(_))
    }
}
