//! Provider API: list models and submit a prompt.

mod client;
mod error;
mod parse;

use async_trait::async_trait;

use crate::core::credentials::Credentials;

pub use client::HttpClient;
pub use error::ApiError;

/// A single prompt submission. Construct with [`PromptRequest::new`] so empty input
/// is rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    model: String,
    message: String,
}

impl PromptRequest {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Result<Self, ApiError> {
        let model = model.into();
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ApiError::validation("Prompt cannot be empty."));
        }
        if model.trim().is_empty() {
            return Err(ApiError::validation("Please select a model."));
        }
        Ok(Self { model, message })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The two provider operations. Implemented over HTTPS by [`HttpClient`];
/// tests substitute counting fakes.
#[async_trait]
pub trait AskSageApi: Send + Sync {
    async fn list_models(&self, credentials: &Credentials) -> Result<Vec<String>, ApiError>;

    async fn submit_prompt(
        &self,
        credentials: &Credentials,
        request: &PromptRequest,
    ) -> Result<String, ApiError>;
}
