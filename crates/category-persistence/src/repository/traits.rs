//! # Repository Traits
//!
//! Abstract repository interface for categories.
//! Implementations can be swapped for different backends (document store, mock, etc.)

use async_trait::async_trait;
use category_domain::{Category, CategoryId, NameQuery, ValidatedCategory};

use crate::error::Result;

/// What `update_category` did
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted {
    /// An existing category was replaced
    Updated(Category),
    /// No category had the id, so one was created
    Inserted(Category),
}

impl Upserted {
    /// The category as it is now stored
    pub const fn category(&self) -> &Category {
        match self {
            Self::Updated(category) | Self::Inserted(category) => category,
        }
    }

    pub fn into_category(self) -> Category {
        match self {
            Self::Updated(category) | Self::Inserted(category) => category,
        }
    }

    pub const fn was_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

// =============================================================================
// CATEGORY REPOSITORY
// =============================================================================

/// Repository for Category entity operations
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Persist a new category, assigning an id when it has none
    async fn add_category(&self, category: ValidatedCategory) -> Result<Category>;

    /// Replace name, description and style of the category with the same
    /// id, creating it when missing
    async fn update_category(&self, category: ValidatedCategory) -> Result<Upserted>;

    /// Remove the category with `id`, returning how many were removed
    async fn delete_category(&self, id: CategoryId) -> Result<u64>;

    /// Every stored category
    async fn find_all(&self) -> Result<Vec<Category>>;

    /// Category by id; `NotFound` when there is none
    async fn find_by_id(&self, id: CategoryId) -> Result<Category>;

    /// Categories whose name contains `name_part` literally
    async fn find_in_title(&self, name_part: &str) -> Result<Vec<Category>>;

    /// Categories whose name matches the query
    async fn search(&self, query: &NameQuery) -> Result<Vec<Category>>;
}
