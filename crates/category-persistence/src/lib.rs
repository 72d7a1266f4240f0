//! # Category Persistence Library
//!
//! Persistence layer for categories.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 API / CLI (external callers)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CategoryRepository                        │
//! │                     (CategoryStore)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      DocumentStore                           │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   MemoryDocumentStore   │   │     RedisDocumentStore       │
//! │   (tests, embedding)    │   │     (hash per collection)    │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `redis`: Enable the Redis document store (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use category_domain::CategoryDraft;
//! use category_persistence::{CategoryRepository, CategoryStore, RedisStoreConfig};
//!
//! let store = category_persistence::connect_redis(RedisStoreConfig::default()).await?;
//!
//! let saved = store
//!     .add_category(CategoryDraft::new("Programming").validate()?)
//!     .await?;
//! let found = store.find_by_id(saved.id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod error;
pub mod repository;

// Re-export commonly used types
pub use document::{
    Document, DocumentStore, Filter, MemoryDocumentStore, Update, UpdateOptions, UpdateOutcome,
};
#[cfg(feature = "redis")]
pub use document::{RedisDocumentStore, RedisStoreConfig};
pub use error::{PersistenceError, Result};
pub use repository::{CATEGORY_COLLECTION, CategoryRepository, CategoryStore, Upserted};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Connect a [`CategoryStore`] to Redis.
///
/// # Errors
///
/// Returns an error if the Redis connection fails.
#[cfg(feature = "redis")]
pub async fn connect_redis(config: RedisStoreConfig) -> Result<CategoryStore> {
    let documents = RedisDocumentStore::new(config).await?;
    Ok(CategoryStore::new(std::sync::Arc::new(documents)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
