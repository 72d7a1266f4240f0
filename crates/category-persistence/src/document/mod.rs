//! # Document Store
//!
//! Minimal document-database client contract consumed by repositories.
//! Backends hold JSON documents per named collection, each keyed by an
//! integer [`PRIMARY_KEY`] that the backend keeps unique.

pub mod memory;
pub mod query;
#[cfg(feature = "redis")]
pub mod redis_client;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryDocumentStore;
pub use query::{
    Document, Filter, PRIMARY_KEY, Update, UpdateOptions, UpdateOutcome, document_key,
};
#[cfg(feature = "redis")]
pub use redis_client::{RedisDocumentStore, RedisStoreConfig};

/// Document store client
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document. Fails with `DuplicateKey` if its key exists.
    ///
    /// A stored key raises the collection's sequence to at least that key.
    async fn insert(&self, collection: &str, document: Document) -> Result<Document>;

    /// All documents matching the filter, in backend order
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// First document matching the filter
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Replace fields of the first match, or insert when `options.upsert`
    /// is set and nothing matched. Upsert inserts raise the sequence like
    /// [`DocumentStore::insert`].
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome>;

    /// Remove every match, returning how many were removed
    async fn remove(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Next value of the collection's key sequence, starting at 1 and above
    /// every key stored through this trait
    async fn next_sequence(&self, collection: &str) -> Result<i64>;
}
