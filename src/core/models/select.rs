//! Default-model policy and filtering.

/// Preferred model when the provider offers it.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// [`DEFAULT_MODEL`] if present, else the first id in server order, else `None`.
pub fn default_model(ids: &[String]) -> Option<&str> {
    ids.iter()
        .find(|id| id.as_str() == DEFAULT_MODEL)
        .or_else(|| ids.first())
        .map(String::as_str)
}

/// Filter model ids by query (case-insensitive substring). Returns all when query is empty.
pub fn filter_models<'a>(ids: &'a [String], query: &str) -> Vec<&'a str> {
    let q = query.trim().to_lowercase();
    ids.iter()
        .map(String::as_str)
        .filter(|id| q.is_empty() || id.to_lowercase().contains(&q))
        .collect()
}
