//! API error taxonomy.

use crate::core::storage::StoreError;

/// Errors from the list-models and submit-prompt calls.
///
/// Every variant is terminal for the triggering operation; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caught before any network call (empty prompt, no model selected, busy).
    #[error("{0}")]
    Validation(String),
    /// Transport failure: connectivity, TLS, timeout.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("No data received.")]
    EmptyResponse,
    #[error("JSON parsing error: {0}")]
    Parse(#[source] serde_json::Error),
    /// Well-formed JSON with the wrong shape or a non-OK status. Carries the raw body.
    #[error("Unexpected response format: {body}")]
    UnexpectedFormat { body: String },
    /// Local settings could not be read before sending.
    #[error("Could not read settings: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn unexpected(body: &[u8]) -> Self {
        ApiError::UnexpectedFormat {
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_keeps_raw_body() {
        let err = ApiError::unexpected(br#"{"response":"ERROR"}"#);
        match &err {
            ApiError::UnexpectedFormat { body } => assert_eq!(body, r#"{"response":"ERROR"}"#),
            _ => panic!("expected UnexpectedFormat, got {:?}", err),
        }
        assert!(err.to_string().starts_with("Unexpected response format:"));
    }

    #[test]
    fn validation_displays_message_verbatim() {
        let err = ApiError::validation("Prompt cannot be empty.");
        assert_eq!(err.to_string(), "Prompt cannot be empty.");
    }

    #[test]
    fn storage_error_is_not_a_validation_error() {
        let err: ApiError = StoreError::Io(std::io::Error::other("disk gone")).into();
        assert!(matches!(err, ApiError::Storage(_)));
        assert!(err.to_string().starts_with("Could not read settings:"));
    }
}
