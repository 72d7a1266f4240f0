//! # Repository Module
//!
//! Repository pattern implementations for category persistence.

pub mod category_store;
pub mod traits;

pub use category_store::{CATEGORY_COLLECTION, CategoryStore, MAX_ID_ATTEMPTS};
pub use traits::{CategoryRepository, Upserted};
