//! 24h cache for the provider's model list.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::core::api::{ApiError, AskSageApi};
use crate::core::credentials::Credentials;
use crate::core::storage::KeyValueStore;

const MODELS_KEY: &str = "storedModels";
const FETCHED_AT_KEY: &str = "lastModelUpdate";

/// How long a fetched list stays fresh, in milliseconds (24h).
pub const REFRESH_INTERVAL_MS: i64 = 86_400_000;

/// Last-known model ids in server order.
///
/// `fetched_at == None` means nothing has been cached yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelList {
    pub ids: Vec<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ModelList {
    pub fn never_fetched(&self) -> bool {
        self.fetched_at.is_none()
    }
}

/// True if no fetch is recorded or the last one is older than [`REFRESH_INTERVAL_MS`].
/// Exactly at the boundary the cache is still fresh.
pub fn should_refresh(now: DateTime<Utc>, last_fetched_at: Option<DateTime<Utc>>) -> bool {
    match last_fetched_at {
        None => true,
        Some(last) => now.signed_duration_since(last).num_milliseconds() > REFRESH_INTERVAL_MS,
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct ModelCache {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn AskSageApi>,
    clock: Clock,
}

impl ModelCache {
    pub fn new(store: Arc<dyn KeyValueStore>, api: Arc<dyn AskSageApi>) -> Self {
        Self {
            store,
            api,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock (tests).
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Timestamp of the last successful fetch, if any.
    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        let value = match self.store.get(FETCHED_AT_KEY) {
            Ok(v) => v?,
            Err(e) => {
                log::warn!("failed to read model cache timestamp: {}", e);
                return None;
            }
        };
        value
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    /// Persisted list without touching the network. Empty with `fetched_at == None`
    /// when nothing usable is cached.
    pub fn load(&self) -> ModelList {
        let ids = match self.store.get(MODELS_KEY) {
            Ok(Some(Value::Array(items))) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Ok(Some(other)) => {
                log::warn!("ignoring malformed model cache entry: {}", other);
                return ModelList::default();
            }
            Ok(None) => return ModelList::default(),
            Err(e) => {
                log::warn!("failed to read model cache: {}", e);
                return ModelList::default();
            }
        };
        ModelList {
            ids,
            fetched_at: self.last_fetched_at(),
        }
    }

    /// Fetch from the provider and persist on success. On failure the cached list
    /// and timestamp are left as they were.
    pub async fn refresh(&self, credentials: &Credentials) -> Result<ModelList, ApiError> {
        let ids = self.api.list_models(credentials).await?;

        let now = (self.clock)();
        let fetched_at = match self.last_fetched_at() {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        let list = ModelList {
            ids,
            fetched_at: Some(fetched_at),
        };
        // Persist failure is non-fatal: we still return the freshly fetched models.
        if let Err(e) = self.save(&list, fetched_at) {
            log::warn!("failed to save models cache: {}", e);
        }
        log::info!("refreshed {} models", list.ids.len());
        Ok(list)
    }

    /// Refresh if stale, otherwise serve the cached list.
    pub async fn get_models(&self, credentials: &Credentials) -> Result<ModelList, ApiError> {
        if should_refresh((self.clock)(), self.last_fetched_at()) {
            log::debug!("model cache stale, fetching from server");
            self.refresh(credentials).await
        } else {
            log::debug!("loading models from local cache");
            Ok(self.load())
        }
    }

    fn save(
        &self,
        list: &ModelList,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), crate::core::storage::StoreError> {
        let ids = list.ids.iter().cloned().map(Value::String).collect();
        self.store.set(MODELS_KEY, Value::Array(ids))?;
        self.store
            .set(FETCHED_AT_KEY, Value::from(fetched_at.timestamp_millis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::api::PromptRequest;
    use crate::core::storage::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake provider that counts list-models calls.
    struct CountingApi {
        models: Mutex<Result<Vec<String>, String>>,
        list_calls: AtomicUsize,
    }

    impl CountingApi {
        fn ok(ids: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                models: Mutex::new(Ok(ids.iter().map(|s| s.to_string()).collect())),
                list_calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                models: Mutex::new(Err("boom".to_string())),
                list_calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AskSageApi for CountingApi {
        async fn list_models(&self, _: &Credentials) -> Result<Vec<String>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            match &*self.models.lock().unwrap() {
                Ok(ids) => Ok(ids.clone()),
                Err(body) => Err(ApiError::unexpected(body.as_bytes())),
            }
        }

        async fn submit_prompt(
            &self,
            _: &Credentials,
            _: &PromptRequest,
        ) -> Result<String, ApiError> {
            unreachable!("model cache never submits prompts")
        }
    }

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn fixed_clock(ms: i64) -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        move || at(ms)
    }

    const DAY_MS: i64 = REFRESH_INTERVAL_MS;

    #[test]
    fn should_refresh_without_prior_fetch() {
        assert!(should_refresh(at(0), None));
        assert!(should_refresh(at(1_700_000_000_000), None));
    }

    #[test]
    fn should_refresh_boundary_is_exclusive() {
        let t = 1_700_000_000_000;
        assert!(!should_refresh(at(t + DAY_MS), Some(at(t))));
        assert!(should_refresh(at(t + DAY_MS + 1), Some(at(t))));
        assert!(!should_refresh(at(t + 1000), Some(at(t))));
    }

    #[test]
    fn should_refresh_false_when_clock_went_backwards() {
        let t = 1_700_000_000_000;
        assert!(!should_refresh(at(t - DAY_MS * 3), Some(at(t))));
    }

    #[test]
    fn load_without_cache_signals_no_data() {
        let cache = ModelCache::new(Arc::new(MemoryStore::new()), CountingApi::ok(&[]));
        let list = cache.load();
        assert!(list.ids.is_empty());
        assert!(list.never_fetched());
    }

    #[tokio::test]
    async fn refresh_persists_list_and_timestamp() {
        let store = Arc::new(MemoryStore::new());
        let api = CountingApi::ok(&["m1", "m2"]);
        let cache = ModelCache::new(store.clone(), api.clone()).with_clock(fixed_clock(5_000));

        let list = cache.refresh(&Credentials::default()).await.unwrap();
        assert_eq!(list.ids, vec!["m1", "m2"]);
        assert_eq!(list.fetched_at, Some(at(5_000)));
        assert_eq!(cache.load(), list);
        assert_eq!(store.get(FETCHED_AT_KEY).unwrap(), Some(json!(5_000)));
    }

    #[tokio::test]
    async fn get_models_within_interval_skips_network() {
        let store = Arc::new(MemoryStore::new());
        let api = CountingApi::ok(&["a", "b"]);
        let fetch_cache =
            ModelCache::new(store.clone(), api.clone()).with_clock(fixed_clock(1_000));
        let first = fetch_cache.get_models(&Credentials::default()).await.unwrap();
        assert_eq!(api.calls(), 1);

        let later = ModelCache::new(store, api.clone()).with_clock(fixed_clock(1_000 + DAY_MS));
        let second = later.get_models(&Credentials::default()).await.unwrap();
        assert_eq!(api.calls(), 1);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn get_models_after_interval_fetches_again() {
        let store = Arc::new(MemoryStore::new());
        let api = CountingApi::ok(&["a"]);
        ModelCache::new(store.clone(), api.clone())
            .with_clock(fixed_clock(0))
            .get_models(&Credentials::default())
            .await
            .unwrap();

        ModelCache::new(store, api.clone())
            .with_clock(fixed_clock(DAY_MS + 1))
            .get_models(&Credentials::default())
            .await
            .unwrap();
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_cache_untouched() {
        let store = Arc::new(MemoryStore::new());
        store.set(MODELS_KEY, json!(["old-1", "old-2"])).unwrap();
        store.set(FETCHED_AT_KEY, json!(10)).unwrap();

        let api = CountingApi::failing();
        let cache = ModelCache::new(store.clone(), api.clone()).with_clock(fixed_clock(DAY_MS * 5));
        let err = cache.get_models(&Credentials::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedFormat { .. }));
        assert_eq!(api.calls(), 1);

        assert_eq!(store.get(MODELS_KEY).unwrap(), Some(json!(["old-1", "old-2"])));
        assert_eq!(store.get(FETCHED_AT_KEY).unwrap(), Some(json!(10)));
        assert_eq!(cache.load().ids, vec!["old-1", "old-2"]);
    }

    #[tokio::test]
    async fn corrupt_cache_file_heals_after_one_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        std::fs::write(&path, "{truncated").unwrap();

        let api = CountingApi::ok(&["m1", "m2"]);
        let cache = ModelCache::new(Arc::new(FileStore::new(&path)), api.clone())
            .with_clock(fixed_clock(1_000));
        for _ in 0..3 {
            let list = cache.get_models(&Credentials::default()).await.unwrap();
            assert_eq!(list.ids, vec!["m1", "m2"]);
        }
        assert_eq!(api.calls(), 1);
        assert!(!cache.load().never_fetched());
    }

    #[tokio::test]
    async fn fetched_at_never_moves_backwards() {
        let store = Arc::new(MemoryStore::new());
        store.set(FETCHED_AT_KEY, json!(50_000)).unwrap();
        let cache =
            ModelCache::new(store, CountingApi::ok(&["x"])).with_clock(fixed_clock(20_000));
        let list = cache.refresh(&Credentials::default()).await.unwrap();
        assert_eq!(list.fetched_at, Some(at(50_000)));
    }
}
