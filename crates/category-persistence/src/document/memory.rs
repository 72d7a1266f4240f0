//! In-process document store backed by a lock-guarded map.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::DocumentStore;
use super::query::{
    Document, Filter, PRIMARY_KEY, Update, UpdateOptions, UpdateOutcome, document_key,
};
use crate::error::{PersistenceError, Result};

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: BTreeMap<i64, Document>,
    sequence: i64,
}

impl MemoryCollection {
    fn first_match(&self, filter: &Filter) -> Option<(i64, &Document)> {
        if let Some(key) = filter.primary_key() {
            return self.documents.get(&key).map(|document| (key, document));
        }
        self.documents
            .iter()
            .find(|(_, document)| filter.matches(document))
            .map(|(key, document)| (*key, document))
    }

    /// Store under a fresh key; the sequence never falls behind a stored key
    fn put_new(&mut self, key: i64, document: Document) {
        self.documents.insert(key, document);
        self.sequence = self.sequence.max(key);
    }
}

/// Memory-resident [`DocumentStore`]. Clones share the same data.
///
/// Documents are yielded in ascending key order.
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.documents.len())
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<Document> {
        let key = document_key(&document).ok_or_else(|| {
            PersistenceError::InvalidQuery(format!(
                "document has no integer `{PRIMARY_KEY}` field"
            ))
        })?;

        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();
        if target.documents.contains_key(&key) {
            return Err(PersistenceError::duplicate_key(collection, key));
        }
        target.put_new(key, document.clone());

        Ok(document)
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(source) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(source
            .documents
            .values()
            .filter(|document| filter.matches(document))
            .cloned()
            .collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|source| source.first_match(filter))
            .map(|(_, document)| document.clone()))
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();

        let matched = target.first_match(filter).map(|(key, _)| key);
        if let Some(key) = matched {
            let Some(document) = target.documents.get_mut(&key) else {
                return Ok(UpdateOutcome::default());
            };
            let before = document.clone();
            update.apply(document);
            return Ok(UpdateOutcome {
                before: Some(before),
                after: Some(document.clone()),
            });
        }

        if !options.upsert {
            return Ok(UpdateOutcome::default());
        }

        let key = filter.primary_key().ok_or_else(|| {
            PersistenceError::InvalidQuery(format!(
                "upsert requires an equality filter on `{PRIMARY_KEY}`"
            ))
        })?;
        let inserted = update.build_insert(key);
        target.put_new(key, inserted.clone());

        Ok(UpdateOutcome {
            before: None,
            after: Some(inserted),
        })
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut removed = 0;
        target.documents.retain(|_, document| {
            let keep = !filter.matches(document);
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }

    async fn next_sequence(&self, collection: &str) -> Result<i64> {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();
        target.sequence += 1;
        Ok(target.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tokio_test::{assert_err, assert_ok};

    const COLLECTION: &str = "things";

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let store = MemoryDocumentStore::new();
        assert_ok!(store.insert(COLLECTION, doc(json!({ "id": 1, "name": "a" }))).await);

        let found = store.find_one(COLLECTION, &Filter::by_key(1)).await.unwrap();
        assert_eq!(found.unwrap()["name"], "a");
        assert!(store.find_one(COLLECTION, &Filter::by_key(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_key() {
        let store = MemoryDocumentStore::new();
        assert_ok!(store.insert(COLLECTION, doc(json!({ "id": 1 }))).await);

        let err = store.insert(COLLECTION, doc(json!({ "id": 1 }))).await.unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateKey { .. }));
        assert_eq!(store.len(COLLECTION).await, 1);
    }

    #[tokio::test]
    async fn test_insert_requires_integer_key() {
        let store = MemoryDocumentStore::new();
        assert_err!(store.insert(COLLECTION, doc(json!({ "id": "one" }))).await);
        assert_err!(store.insert(COLLECTION, doc(json!({ "name": "x" }))).await);
        assert!(store.is_empty(COLLECTION).await);
    }

    #[tokio::test]
    async fn test_find_on_unknown_collection_is_empty() {
        let store = MemoryDocumentStore::new();
        let found = store.find("nothing", &Filter::All).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_update_without_upsert_on_missing_is_noop() {
        let store = MemoryDocumentStore::new();
        let outcome = store
            .find_one_and_update(
                COLLECTION,
                &Filter::by_key(9),
                Update::set(doc(json!({ "name": "x" }))),
                UpdateOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::default());
        assert!(store.is_empty(COLLECTION).await);
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let store = MemoryDocumentStore::new();
        let update = || Update::set(doc(json!({ "name": "x" })));

        let first = store
            .find_one_and_update(COLLECTION, &Filter::by_key(4), update(), UpdateOptions::upsert())
            .await
            .unwrap();
        assert!(first.before.is_none());
        assert_eq!(first.after.unwrap()["id"], 4);

        let second = store
            .find_one_and_update(COLLECTION, &Filter::by_key(4), update(), UpdateOptions::upsert())
            .await
            .unwrap();
        assert!(second.before.is_some());
        assert_eq!(store.len(COLLECTION).await, 1);
    }

    #[tokio::test]
    async fn test_upsert_without_key_filter_is_rejected() {
        let store = MemoryDocumentStore::new();
        let err = store
            .find_one_and_update(
                COLLECTION,
                &Filter::eq("name", "x"),
                Update::default(),
                UpdateOptions::upsert(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PersistenceError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_remove_counts_matches() {
        let store = MemoryDocumentStore::new();
        for id in 0..3 {
            store.insert(COLLECTION, doc(json!({ "id": id, "kind": "a" }))).await.unwrap();
        }

        assert_eq!(store.remove(COLLECTION, &Filter::by_key(0)).await.unwrap(), 1);
        assert_eq!(store.remove(COLLECTION, &Filter::by_key(0)).await.unwrap(), 0);
        assert_eq!(store.remove(COLLECTION, &Filter::eq("kind", "a")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sequence_is_per_collection() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.next_sequence("a").await.unwrap(), 1);
        assert_eq!(store.next_sequence("a").await.unwrap(), 2);
        assert_eq!(store.next_sequence("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_keyed_inserts_raise_sequence() {
        let store = MemoryDocumentStore::new();
        store.insert(COLLECTION, doc(json!({ "id": 5 }))).await.unwrap();
        assert_eq!(store.next_sequence(COLLECTION).await.unwrap(), 6);

        store
            .find_one_and_update(
                COLLECTION,
                &Filter::by_key(20),
                Update::default(),
                UpdateOptions::upsert(),
            )
            .await
            .unwrap();
        assert_eq!(store.next_sequence(COLLECTION).await.unwrap(), 21);

        // A key below the counter leaves it alone
        store.insert(COLLECTION, doc(json!({ "id": 3 }))).await.unwrap();
        assert_eq!(store.next_sequence(COLLECTION).await.unwrap(), 22);
    }

    #[tokio::test]
    async fn test_remove_on_unknown_collection_counts_nothing() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.remove("nothing", &Filter::All).await.unwrap(), 0);
    }
}
