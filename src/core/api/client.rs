//! HTTPS implementation of [`AskSageApi`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::core::config::Config;
use crate::core::credentials::Credentials;

use super::error::ApiError;
use super::parse::{parse_models_body, parse_query_body};
use super::{AskSageApi, PromptRequest};

const ACCESS_TOKEN_HEADER: &str = "x-access-tokens";

#[derive(Serialize)]
struct QueryBody<'a> {
    model: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dataset: Option<&'a str>,
}

/// Single-shot JSON client. No retries; every call is bounded by
/// `Config::request_timeout` and surfaces as `ApiError::Network` when it expires.
pub struct HttpClient {
    client: reqwest::Client,
    config: Config,
}

impl HttpClient {
    pub fn new(config: Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("http client builder failed, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self { client, config }
    }

    /// Send and read the full body. HTTP status is logged, not classified:
    /// error statuses still go through body classification.
    async fn fetch(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let resp = request.send().await.map_err(ApiError::Network)?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(ApiError::Network)?;
        if status.is_success() {
            log::debug!("{} ({} bytes)", status, body.len());
        } else {
            log::warn!("server returned {}", status);
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl AskSageApi for HttpClient {
    async fn list_models(&self, credentials: &Credentials) -> Result<Vec<String>, ApiError> {
        let url = self.config.models_url();
        log::info!("fetching models from {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, "application/json");
        if self.config.authorize_model_list {
            request = request.header(ACCESS_TOKEN_HEADER, &credentials.token);
        }

        let body = self.fetch(request).await?;
        let models = parse_models_body(&body)?;
        log::debug!("received {} models", models.len());
        Ok(models)
    }

    async fn submit_prompt(
        &self,
        credentials: &Credentials,
        request: &PromptRequest,
    ) -> Result<String, ApiError> {
        let url = self.config.query_url();
        let payload = QueryBody {
            model: request.model(),
            message: request.message(),
            dataset: self.config.dataset.as_deref(),
        };
        log::info!("submitting prompt to {} (model {})", url, request.model());

        let http = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCESS_TOKEN_HEADER, &credentials.token)
            .json(&payload);

        let body = self.fetch(http).await?;
        parse_query_body(&body)
    }
}
