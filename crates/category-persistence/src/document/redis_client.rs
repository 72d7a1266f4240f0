//! # Redis Document Store
//!
//! Keeps each collection in one Redis hash: field = primary key in decimal,
//! value = the JSON document. The key sequence is an `INCR` counter. New
//! documents go through a Lua script that runs `HSETNX` and raises the
//! counter to the new key, so uniqueness and the sequence move together.
//!
//! Filters other than a primary-key equality are evaluated client-side over
//! `HVALS`. `find_one_and_update` is a read followed by a write and is not
//! atomic across clients.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use serde_json::Value;

use super::DocumentStore;
use super::query::{
    Document, Filter, PRIMARY_KEY, Update, UpdateOptions, UpdateOutcome, document_key,
};
use crate::error::{PersistenceError, Result};

/// KEYS: collection hash, sequence counter. ARGV: key, JSON document.
/// Returns 1 when the document was stored, 0 when the key was taken.
const INSERT_SCRIPT: &str = r"
if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2]) == 0 then
    return 0
end
local current = tonumber(redis.call('GET', KEYS[2]) or '0')
if tonumber(ARGV[1]) > current then
    redis.call('SET', KEYS[2], ARGV[1])
end
return 1
";

/// Redis document store configuration
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    pub url: String,
    /// Namespace prepended to every key this store touches
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "category_store".to_string(),
        }
    }
}

/// Hash holding the documents of `collection`
fn collection_key(prefix: &str, collection: &str) -> String {
    format!("{prefix}:{collection}")
}

/// Counter backing `next_sequence` for `collection`
fn sequence_key(prefix: &str, collection: &str) -> String {
    format!("{prefix}:{collection}:seq")
}

fn decode_document(json: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(document) => Ok(document),
        other => Err(PersistenceError::Serialization(format!(
            "stored document is not a JSON object: {other}"
        ))),
    }
}

fn encode_document(document: &Document) -> Result<String> {
    Ok(serde_json::to_string(document)?)
}

fn require_key(document: &Document) -> Result<i64> {
    document_key(document).ok_or_else(|| {
        PersistenceError::InvalidQuery(format!("document has no integer `{PRIMARY_KEY}` field"))
    })
}

/// Redis-backed [`DocumentStore`]
#[derive(Clone)]
pub struct RedisDocumentStore {
    conn: ConnectionManager,
    config: RedisStoreConfig,
    insert_script: Script,
}

impl RedisDocumentStore {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn new(config: RedisStoreConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        tracing::debug!(url = %config.url, prefix = %config.key_prefix, "Redis document store connected");
        Ok(Self {
            conn,
            config,
            insert_script: Script::new(INSERT_SCRIPT),
        })
    }

    pub const fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    fn collection_key(&self, collection: &str) -> String {
        collection_key(&self.config.key_prefix, collection)
    }

    async fn get_by_key(&self, collection: &str, key: i64) -> Result<Option<Document>> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.hget(self.collection_key(collection), key).await?;
        json.as_deref().map(decode_document).transpose()
    }

    /// Matching documents, using a direct field lookup when the filter pins a key
    async fn load_matching(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        if let Some(key) = filter.primary_key() {
            return Ok(self.get_by_key(collection, key).await?.into_iter().collect());
        }

        let mut conn = self.conn.clone();
        let values: Vec<String> = conn.hvals(self.collection_key(collection)).await?;

        let mut matching = Vec::new();
        for json in values {
            let document = decode_document(&json)?;
            if filter.matches(&document) {
                matching.push(document);
            }
        }
        Ok(matching)
    }

    async fn write(&self, collection: &str, key: i64, document: &Document) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(self.collection_key(collection), key, encode_document(document)?)
            .await?;
        Ok(())
    }

    /// Write only if the key is free, raising the sequence to it; false when
    /// the key is taken
    async fn write_new(&self, collection: &str, key: i64, document: &Document) -> Result<bool> {
        let mut conn = self.conn.clone();
        let created: bool = self
            .insert_script
            .key(self.collection_key(collection))
            .key(sequence_key(&self.config.key_prefix, collection))
            .arg(key)
            .arg(encode_document(document)?)
            .invoke_async(&mut conn)
            .await?;
        Ok(created)
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn insert(&self, collection: &str, document: Document) -> Result<Document> {
        let key = require_key(&document)?;

        if !self.write_new(collection, key, &document).await? {
            return Err(PersistenceError::duplicate_key(collection, key));
        }
        Ok(document)
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.load_matching(collection, filter).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.load_matching(collection, filter).await?.into_iter().next())
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        update: Update,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome> {
        if let Some(before) = self.find_one(collection, filter).await? {
            let key = require_key(&before)?;
            let mut after = before.clone();
            update.apply(&mut after);
            self.write(collection, key, &after).await?;
            return Ok(UpdateOutcome {
                before: Some(before),
                after: Some(after),
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
        if self.write_new(collection, key, &inserted).await? {
            return Ok(UpdateOutcome {
                before: None,
                after: Some(inserted),
            });
        }

        // Another client inserted the key between our read and write
        tracing::debug!(collection, key, "Upsert raced with an insert, updating instead");
        let Some(before) = self.get_by_key(collection, key).await? else {
            return Err(PersistenceError::duplicate_key(collection, key));
        };
        let mut after = before.clone();
        update.apply(&mut after);
        self.write(collection, key, &after).await?;
        Ok(UpdateOutcome {
            before: Some(before),
            after: Some(after),
        })
    }

    async fn remove(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let keys: Vec<i64> = self
            .load_matching(collection, filter)
            .await?
            .iter()
            .filter_map(document_key)
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let removed: u64 = conn.hdel(self.collection_key(collection), keys).await?;
        Ok(removed)
    }

    async fn next_sequence(&self, collection: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        let next: i64 = conn
            .incr(sequence_key(&self.config.key_prefix, collection), 1i64)
            .await?;
        Ok(next)
    }
}
