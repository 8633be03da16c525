//! Front-end state: model selection, prompt submission, and the hand-off of
//! background results to the owning thread.
//!
//! Network work runs on a tokio runtime. Completions come back as
//! [`SessionEvent`]s over a channel and only [`Session::apply`] mutates state, so the
//! thread that owns the `Session` is the single writer.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::core::api::{ApiError, AskSageApi, PromptRequest};
use crate::core::credentials::{CredentialStore, Credentials};
use crate::core::models::{self, ModelCache, ModelList};
use crate::core::storage::StoreError;

/// Submission lifecycle. `Succeeded` and `Failed` accept a new submission like `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

/// Background completion delivered to the owning thread.
#[derive(Debug)]
pub enum SessionEvent {
    ModelsLoaded {
        generation: u64,
        list: ModelList,
        /// Refresh failure; `list` is then whatever the cache already held.
        error: Option<ApiError>,
    },
    PromptFinished {
        generation: u64,
        result: Result<String, ApiError>,
    },
}

pub struct Session {
    handle: Handle,
    api: Arc<dyn AskSageApi>,
    cache: ModelCache,
    credentials: CredentialStore,
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
    models: Vec<String>,
    selected_model: String,
    submit_state: SubmitState,
    response_text: String,
    error_message: Option<String>,
    loading_models: bool,
    models_generation: u64,
    prompt_generation: u64,
}

impl Session {
    pub fn new(
        handle: Handle,
        api: Arc<dyn AskSageApi>,
        cache: ModelCache,
        credentials: CredentialStore,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            handle,
            api,
            cache,
            credentials,
            tx,
            rx,
            models: Vec::new(),
            selected_model: String::new(),
            submit_state: SubmitState::Idle,
            response_text: String::new(),
            error_message: None,
            loading_models: false,
            models_generation: 0,
            prompt_generation: 0,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submit_state
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_loading_models(&self) -> bool {
        self.loading_models
    }

    /// True when no access token is configured (settings must be shown first).
    pub fn needs_settings(&self) -> bool {
        match self.credentials.get() {
            Ok(c) => !c.has_token(),
            Err(e) => {
                log::warn!("failed to read credentials: {}", e);
                true
            }
        }
    }

    /// Persist credentials, then reload models with them.
    pub fn save_settings(&mut self, credentials: &Credentials) -> Result<(), StoreError> {
        self.credentials.set(credentials)?;
        self.load_models();
        Ok(())
    }

    /// The selection is not checked against the model list.
    pub fn select_model(&mut self, model: &str) {
        if !self.models.iter().any(|m| m == model) {
            log::warn!("selected model {} is not in the known model list", model);
        }
        self.selected_model = model.to_string();
    }

    /// Start a model load (network only when the cache is stale). Supersedes any
    /// load still in flight.
    pub fn load_models(&mut self) {
        let credentials = match self.credentials.get() {
            Ok(c) => c,
            Err(e) => {
                self.error_message = Some(e.to_string());
                return;
            }
        };
        self.models_generation += 1;
        self.loading_models = true;

        let generation = self.models_generation;
        let cache = self.cache.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let (list, error) = match cache.get_models(&credentials).await {
                Ok(list) => (list, None),
                Err(e) => {
                    log::warn!("model refresh failed: {}", e);
                    (cache.load(), Some(e))
                }
            };
            let _ = tx.send(SessionEvent::ModelsLoaded {
                generation,
                list,
                error,
            });
        });
    }

    /// Validate and send a prompt. Validation failures return synchronously without
    /// touching the network; a submission while another is in flight is rejected.
    pub fn submit(&mut self, prompt: &str) -> Result<(), ApiError> {
        if self.submit_state == SubmitState::Sending {
            return Err(ApiError::validation("A prompt is already being sent."));
        }
        let request = match PromptRequest::new(self.selected_model.clone(), prompt) {
            Ok(r) => r,
            Err(e) => {
                self.error_message = Some(e.to_string());
                return Err(e);
            }
        };
        let credentials = match self.credentials.get() {
            Ok(c) => c,
            Err(e) => {
                log::error!("reading credentials failed: {}", e);
                let err = ApiError::Storage(e);
                self.error_message = Some(err.to_string());
                return Err(err);
            }
        };

        self.prompt_generation += 1;
        self.submit_state = SubmitState::Sending;

        let generation = self.prompt_generation;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = api.submit_prompt(&credentials, &request).await;
            let _ = tx.send(SessionEvent::PromptFinished { generation, result });
        });
        Ok(())
    }

    /// Apply every completion already delivered. Returns how many were received.
    pub fn poll(&mut self) -> usize {
        let mut received = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            received += 1;
        }
        received
    }

    /// Block until one completion arrives (or `timeout` passes) and apply it.
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                true
            }
            Err(_) => false,
        }
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ModelsLoaded {
                generation,
                list,
                error,
            } => {
                if generation != self.models_generation {
                    log::debug!("discarding superseded model load #{}", generation);
                    return;
                }
                self.loading_models = false;
                self.selected_model = models::default_model(&list.ids)
                    .unwrap_or_default()
                    .to_string();
                self.error_message = match error {
                    Some(e) => Some(e.to_string()),
                    None if list.never_fetched() => {
                        Some("No locally stored models available.".to_string())
                    }
                    None => None,
                };
                self.models = list.ids;
            }
            SessionEvent::PromptFinished { generation, result } => {
                if generation != self.prompt_generation {
                    log::debug!("discarding superseded prompt result #{}", generation);
                    return;
                }
                match result {
                    Ok(text) => {
                        self.response_text = text;
                        self.error_message = None;
                        self.submit_state = SubmitState::Succeeded;
                    }
                    Err(e) => {
                        self.response_text = "Error: Unable to retrieve completion.".to_string();
                        self.error_message = Some(e.to_string());
                        self.submit_state = SubmitState::Failed;
                    }
                }
            }
        }
    }
}
