//! Category repository over a [`DocumentStore`].

use async_trait::async_trait;
use category_domain::{Category, CategoryId, MatchMode, NameQuery, ValidatedCategory};
use chrono::Utc;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::sync::Arc;

use super::traits::{CategoryRepository, Upserted};
use crate::document::{
    Document, DocumentStore, Filter, MemoryDocumentStore, Update, UpdateOptions,
};
use crate::error::{PersistenceError, Result};

/// Collection holding category documents
pub const CATEGORY_COLLECTION: &str = "categories";

/// Generated ids tried before `add_category` gives up on collisions
pub const MAX_ID_ATTEMPTS: usize = 8;

/// Fields an update replaces; everything else is only written on insert
const REPLACED_FIELDS: [&str; 3] = ["name", "description", "style"];

const ENTITY: &str = "category";

fn to_document(category: &Category) -> Result<Document> {
    match serde_json::to_value(category)? {
        Value::Object(document) => Ok(document),
        other => Err(PersistenceError::Serialization(format!(
            "category did not serialize to an object: {other}"
        ))),
    }
}

fn from_document(document: Document) -> Result<Category> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

fn from_documents(documents: Vec<Document>) -> Result<Vec<Category>> {
    documents.into_iter().map(from_document).collect()
}

/// Build the name filter for a search. Only [`MatchMode::Pattern`] hands the
/// caller's text to the regex engine unescaped.
fn name_filter(query: &NameQuery) -> Result<Filter> {
    let pattern = match query.mode {
        MatchMode::Literal => Regex::new(&regex::escape(&query.text))?,
        MatchMode::CaseInsensitive => RegexBuilder::new(&regex::escape(&query.text))
            .case_insensitive(true)
            .build()?,
        MatchMode::Pattern => Regex::new(&query.text)?,
    };
    Ok(Filter::matches_pattern("name", pattern))
}

/// Category persistence operations against the `categories` collection.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct CategoryStore {
    documents: Arc<dyn DocumentStore>,
}

impl CategoryStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Store backed by a fresh [`MemoryDocumentStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDocumentStore::new()))
    }

    async fn insert_category(&self, category: &Category) -> Result<Category> {
        let stored = self
            .documents
            .insert(CATEGORY_COLLECTION, to_document(category)?)
            .await?;
        from_document(stored)
    }

    /// Insert under sequence-drawn ids. Keyed inserts keep the sequence above
    /// stored ids, so a taken id only shows up when another writer got there
    /// first; it is skipped and the next one drawn.
    async fn insert_with_generated_id(&self, category: ValidatedCategory) -> Result<Category> {
        let now = Utc::now();
        let mut last_id = None;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = self.documents.next_sequence(CATEGORY_COLLECTION).await?;
            let record = category.clone().into_category(id, now);

            match self.insert_category(&record).await {
                Err(PersistenceError::DuplicateKey { .. }) => {
                    tracing::warn!(id, attempt, "Generated category id already taken");
                    last_id = Some(id);
                }
                result => return result,
            }
        }

        Err(PersistenceError::duplicate_key(
            CATEGORY_COLLECTION,
            last_id.unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl CategoryRepository for CategoryStore {
    async fn add_category(&self, category: ValidatedCategory) -> Result<Category> {
        tracing::debug!("Saving new category");

        let saved = if category.id().is_some() {
            let record = category.into_category(0, Utc::now());
            self.insert_category(&record).await?
        } else {
            self.insert_with_generated_id(category).await?
        };

        tracing::debug!(id = saved.id, "New category saved");
        Ok(saved)
    }

    async fn update_category(&self, category: ValidatedCategory) -> Result<Upserted> {
        let id = category.id().ok_or(PersistenceError::MissingId)?;
        tracing::debug!(id, "Updating category");

        let mut set_on_insert = to_document(&category.into_category(id, Utc::now()))?;
        let set: Document = REPLACED_FIELDS
            .iter()
            .filter_map(|field| {
                set_on_insert
                    .remove(*field)
                    .map(|value| ((*field).to_string(), value))
            })
            .collect();
        let update = Update::set(set).with_set_on_insert(set_on_insert);

        let outcome = self
            .documents
            .find_one_and_update(
                CATEGORY_COLLECTION,
                &Filter::by_key(id),
                update,
                UpdateOptions::upsert(),
            )
            .await?;

        let after = outcome
            .after
            .ok_or_else(|| PersistenceError::not_found(ENTITY, id))?;
        let current = from_document(after)?;

        if outcome.before.is_some() {
            Ok(Upserted::Updated(current))
        } else {
            tracing::debug!(id, "No category to update, inserted instead");
            Ok(Upserted::Inserted(current))
        }
    }

    async fn delete_category(&self, id: CategoryId) -> Result<u64> {
        tracing::debug!(id, "Deleting category");

        let removed = self
            .documents
            .remove(CATEGORY_COLLECTION, &Filter::by_key(id))
            .await?;

        tracing::debug!(id, removed, "Category delete finished");
        Ok(removed)
    }

    async fn find_all(&self) -> Result<Vec<Category>> {
        tracing::debug!("Retrieving every category");

        let documents = self.documents.find(CATEGORY_COLLECTION, &Filter::All).await?;
        let categories = from_documents(documents)?;

        tracing::debug!(count = categories.len(), "Found categories");
        Ok(categories)
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Category> {
        tracing::debug!(id, "Getting category");

        let document = self
            .documents
            .find_one(CATEGORY_COLLECTION, &Filter::by_key(id))
            .await?
            .ok_or_else(|| PersistenceError::not_found(ENTITY, id))?;

        from_document(document)
    }

    async fn find_in_title(&self, name_part: &str) -> Result<Vec<Category>> {
        self.search(&NameQuery::literal(name_part)).await
    }

    async fn search(&self, query: &NameQuery) -> Result<Vec<Category>> {
        tracing::debug!(text = %query.text, mode = ?query.mode, "Finding categories by name");

        let filter = name_filter(query)?;
        let documents = self.documents.find(CATEGORY_COLLECTION, &filter).await?;
        let categories = from_documents(documents)?;

        tracing::debug!(count = categories.len(), "Found categories matching the name query");
        Ok(categories)
    }
}
