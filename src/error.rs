use thiserror::Error;

/// Failures a user can see. All of them are local to the operation that
/// raised them; the session keeps working afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// A route load (list and/or detail) failed. The last good list stays up.
    #[error("failed to load {location}: {reason}")]
    FetchFailed { location: String, reason: String },

    /// The store could not create (or change) a contact.
    #[error("contact store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AppError {
    pub fn fetch_failed(location: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AppError::FetchFailed {
            location: location.into(),
            reason: err.to_string(),
        }
    }

    /// Wrap a store error, keeping the whole context chain in the message.
    pub fn store_unavailable(err: &anyhow::Error) -> Self {
        AppError::StoreUnavailable(format!("{:#}", err))
    }
}
