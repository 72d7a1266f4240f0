//! Persistence layer error types

use thiserror::Error;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Entity not found: {entity_type} with key {key}")]
    NotFound { entity_type: String, key: String },

    #[error("Duplicate key {key} in collection {collection}")]
    DuplicateKey { collection: String, key: String },

    #[error("Category id is required for this operation")]
    MissingId,

    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),
}

impl PersistenceError {
    pub fn not_found(entity_type: &str, key: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            key: key.to_string(),
        }
    }

    pub fn duplicate_key(collection: &str, key: impl ToString) -> Self {
        Self::DuplicateKey {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    /// True when the lookup succeeded but nothing matched
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<regex::Error> for PersistenceError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for PersistenceError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_backend_failure() {
        assert!(PersistenceError::not_found("category", 42).is_not_found());
        assert!(!PersistenceError::Redis("connection refused".into()).is_not_found());
    }
}
