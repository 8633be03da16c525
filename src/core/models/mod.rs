//! Model list caching and default selection.

mod cache;
mod select;

pub use cache::{ModelCache, ModelList};
pub use select::{default_model, filter_models};
