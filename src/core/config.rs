use std::env;
use std::time::Duration;

/// Fixed provider endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.asksage.ai/server";

/// Dataset sent with every prompt unless overridden.
pub const DEFAULT_DATASET: &str = "none";

/// Whole-request timeout for both provider calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Startup configuration handed to the API client at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    /// `None` omits the `dataset` field from prompt bodies.
    pub dataset: Option<String>,
    /// Attach the access token to the list-models call as well.
    pub authorize_model_list: bool,
    /// Upper bound on connect plus response for a single call.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            dataset: Some(DEFAULT_DATASET.to_string()),
            authorize_model_list: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    pub fn models_url(&self) -> String {
        format!("{}/get-models", self.base_url.trim_end_matches('/'))
    }

    pub fn query_url(&self) -> String {
        format!("{}/query", self.base_url.trim_end_matches('/'))
    }
}

/// Load configuration from environment, falling back to the defaults.
pub fn load() -> Config {
    from_lookup(|key| env::var(key).ok())
}

fn from_lookup<F>(lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let base_url = lookup("ASKSAGE_BASE_URL")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or(defaults.base_url);

    // Present-but-empty disables the field entirely.
    let dataset = match lookup("ASKSAGE_DATASET") {
        Some(s) if s.trim().is_empty() => None,
        Some(s) => Some(s.trim().to_string()),
        None => defaults.dataset,
    };

    let authorize_model_list = lookup("ASKSAGE_AUTH_MODEL_LIST")
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(defaults.authorize_model_list);

    // Zero or unparsable falls back to the default rather than disabling the timeout.
    let request_timeout = lookup("ASKSAGE_TIMEOUT_SECS")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(defaults.request_timeout);

    Config {
        base_url,
        dataset,
        authorize_model_list,
        request_timeout,
    }
}
