//! CLI-only commands: config info, config set, models list.
//!
//! These run without the interactive loop and produce plain text output.

use std::io::{self, Read};
use std::sync::Arc;

use crate::core::api::{AskSageApi, HttpClient};
use crate::core::config::Config;
use crate::core::credentials::{CredentialStore, Credentials};
use crate::core::models::{self, ModelCache};
use crate::core::paths;
use crate::core::storage::{FileStore, KeyValueStore, MemoryStore};

/// Settings store at the platform config path; in-memory when no home directory exists.
pub fn settings_store() -> Arc<dyn KeyValueStore> {
    match paths::settings_path() {
        Some(p) => Arc::new(FileStore::new(p)),
        None => {
            log::warn!("no config directory; settings will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Models cache store at the platform cache path; in-memory when no home directory exists.
pub fn models_store() -> Arc<dyn KeyValueStore> {
    match paths::models_cache_path() {
        Some(p) => Arc::new(FileStore::new(p)),
        None => {
            log::warn!("no cache directory; model list will not persist");
            Arc::new(MemoryStore::new())
        }
    }
}

pub fn credential_store() -> CredentialStore {
    CredentialStore::new(settings_store())
}

pub fn model_cache(api: Arc<dyn AskSageApi>) -> ModelCache {
    ModelCache::new(models_store(), api)
}

fn display_path(p: Option<std::path::PathBuf>) -> String {
    p.map(|p| p.display().to_string())
        .unwrap_or_else(|| "—".to_string())
}

/// Run the `config` command: display paths, endpoint, and credential status.
pub fn run_config(config: &Config) {
    let (token_status, account) = match credential_store().get() {
        Ok(c) if c.has_token() => ("set ✓", c.account),
        Ok(c) => ("not set", c.account),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let cache = model_cache(Arc::new(HttpClient::new(config.clone())));
    let fetched = cache
        .last_fetched_at()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("Settings:     {}", display_path(paths::settings_path()));
    println!("Models cache: {}", display_path(paths::models_cache_path()));
    println!("Endpoint:     {}", config.base_url);
    println!(
        "Dataset:      {}",
        config.dataset.as_deref().unwrap_or("(omitted)")
    );
    println!("Timeout:      {}s", config.request_timeout.as_secs());
    println!(
        "Account:      {}",
        if account.is_empty() { "—" } else { account.as_str() }
    );
    println!("Access token: {}", token_status);
    println!("Models fetch: {}", fetched);
}

/// Run the `config set` command. Missing token is read from stdin; a missing
/// account keeps the stored one.
pub fn run_config_set(token: Option<String>, account: Option<String>) {
    let store = credential_store();
    let current = store.get().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let token = match token {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => {
            let mut buf = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buf) {
                eprintln!("Error reading from stdin: {}", e);
                std::process::exit(1);
            }
            let trimmed = buf.trim().to_string();
            if trimmed.is_empty() {
                eprintln!("Error: no access token provided");
                std::process::exit(1);
            }
            trimmed
        }
    };
    let account = account
        .map(|a| a.trim().to_string())
        .unwrap_or(current.account);

    match store.set(&Credentials::new(token, account)) {
        Ok(()) => println!(
            "Settings saved to {}",
            display_path(paths::settings_path())
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the `models` command: list model ids from cache or API, marking the default.
pub async fn run_models(config: &Config, query: Option<&str>, force_refresh: bool) {
    let credentials = credential_store().get().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let cache = model_cache(Arc::new(HttpClient::new(config.clone())));

    let result = if force_refresh {
        cache.refresh(&credentials).await
    } else {
        cache.get_models(&credentials).await
    };
    let list = match result {
        Ok(list) => list,
        Err(e) => {
            let cached = cache.load();
            if cached.never_fetched() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            eprintln!("Warning: {} (showing cached models)", e);
            cached
        }
    };

    let default = models::default_model(&list.ids);
    let filtered = models::filter_models(&list.ids, query.unwrap_or(""));
    if filtered.is_empty() {
        println!("No models found.");
        return;
    }
    for id in &filtered {
        let marker = if Some(*id) == default { "*" } else { " " };
        println!("{} {}", marker, id);
    }
    println!("\n{} model(s) listed", filtered.len());
}
