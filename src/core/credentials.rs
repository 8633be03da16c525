//! Access token and account storage on top of a [`KeyValueStore`].

use std::sync::Arc;

use serde_json::Value;

use crate::core::storage::{KeyValueStore, StoreError};

const TOKEN_KEY: &str = "apiKey";
const ACCOUNT_KEY: &str = "username";

/// User-supplied credentials. No validation: an empty token is a valid (if useless) state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub account: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            account: account.into(),
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current credentials; unset fields read as empty strings.
    pub fn get(&self) -> Result<Credentials, StoreError> {
        Ok(Credentials {
            token: self.read_string(TOKEN_KEY)?,
            account: self.read_string(ACCOUNT_KEY)?,
        })
    }

    /// Persist both fields immediately.
    pub fn set(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.store
            .set(TOKEN_KEY, Value::String(credentials.token.clone()))?;
        self.store
            .set(ACCOUNT_KEY, Value::String(credentials.account.clone()))?;
        log::info!("credentials updated (account: {})", credentials.account);
        Ok(())
    }

    fn read_string(&self, key: &str) -> Result<String, StoreError> {
        Ok(match self.store.get(key)? {
            Some(Value::String(s)) => s,
            _ => String::new(),
        })
    }
}
