/// Error taxonomy for MAAS API calls
use thiserror::Error;

/// Failures that abort a MAAS call.
///
/// Domain-level "could not find X" conditions are not errors; they are
/// returned as [`Outcome::Error`](super::models::Outcome) records.
#[derive(Error, Debug)]
pub enum MaasError {
    /// A required credential is missing or malformed. Raised before any request is sent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP backend could not be initialised.
    #[error("HTTP client unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MaasError {
    #[cfg(test)]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MaasError::Http(_) | MaasError::Api { .. } | MaasError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MaasError>;
