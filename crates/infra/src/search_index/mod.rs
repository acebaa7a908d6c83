//! Search index boundary.
//!
//! A best-effort, eventually consistent text index over stock records. It
//! is never the source of truth; drift is repaired by re-saving records.

pub mod in_memory;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemorySearchIndex;
pub use query::SearchQuery;
pub use r#trait::{IndexError, SearchIndex};
