//! # Category Store - Domain Model
//!
//! Core entity, value objects and query types for category persistence.
//! These types are shared by the persistence layer and every front end
//! that reads or writes categories.
//!
//! Write paths only accept a [`ValidatedCategory`], which can only be
//! produced by [`CategoryDraft::validate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric category identifier. Zero is a valid id.
pub type CategoryId = i64;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Card presentation settings attached to every category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStyle {
    #[serde(rename = "cardBackGroundColor")]
    pub card_background_color: String,
    #[serde(rename = "cardBackGroundColorClass")]
    pub card_background_color_class: String,
    #[serde(rename = "cardForeGroundColor")]
    pub card_foreground_color: String,
    #[serde(rename = "cardForeGroundColorClass")]
    pub card_foreground_color_class: String,
    #[serde(rename = "cardFontName")]
    pub card_font_name: String,
    #[serde(rename = "cardFontSize")]
    pub card_font_size: f64,
}

impl Default for CategoryStyle {
    fn default() -> Self {
        Self {
            card_background_color: "#ffffff".to_string(),
            card_background_color_class: String::new(),
            card_foreground_color: "#000000".to_string(),
            card_foreground_color_class: String::new(),
            card_font_name: "Arial".to_string(),
            card_font_size: 14.0,
        }
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// Category entity - a persisted, named card with a style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// 0/1 flag, meaning left to the caller
    pub checked: i32,
    pub style: CategoryStyle,
    #[serde(rename = "creationDate")]
    pub creation_date: DateTime<Utc>,
}

// =============================================================================
// WRITE MODELS
// =============================================================================

/// Unvalidated category input.
///
/// `id` and `creation_date` are optional; the store fills them in on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub checked: i32,
    #[serde(default)]
    pub style: CategoryStyle,
    #[serde(
        rename = "creationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_date: Option<DateTime<Utc>>,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            checked: 0,
            style: CategoryStyle::default(),
            creation_date: None,
        }
    }

    #[must_use]
    pub const fn with_id(mut self, id: CategoryId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_checked(mut self, checked: i32) -> Self {
        self.checked = checked;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: CategoryStyle) -> Self {
        self.style = style;
        self
    }

    /// Check the draft and seal it into a [`ValidatedCategory`].
    ///
    /// # Errors
    ///
    /// Returns the first rule the draft breaks: an empty name, a `checked`
    /// value other than 0 or 1, or a font size that is not a positive
    /// finite number.
    pub fn validate(self) -> Result<ValidatedCategory, CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        if !matches!(self.checked, 0 | 1) {
            return Err(CategoryValidationError::InvalidChecked(self.checked));
        }
        let size = self.style.card_font_size;
        if !size.is_finite() || size <= 0.0 {
            return Err(CategoryValidationError::InvalidFontSize(size));
        }
        Ok(ValidatedCategory(self))
    }
}

impl From<Category> for CategoryDraft {
    fn from(category: Category) -> Self {
        Self {
            id: Some(category.id),
            name: category.name,
            description: category.description,
            checked: category.checked,
            style: category.style,
            creation_date: Some(category.creation_date),
        }
    }
}

/// A draft that passed [`CategoryDraft::validate`].
///
/// The inner draft is private, so holding one of these is proof the
/// contract was checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCategory(CategoryDraft);

impl ValidatedCategory {
    pub const fn id(&self) -> Option<CategoryId> {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn description(&self) -> &str {
        &self.0.description
    }

    pub const fn checked(&self) -> i32 {
        self.0.checked
    }

    pub const fn style(&self) -> &CategoryStyle {
        &self.0.style
    }

    pub const fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.0.creation_date
    }

    /// Build the persisted form, using `id` and `now` only where the draft
    /// left them unset.
    #[must_use]
    pub fn into_category(self, id: CategoryId, now: DateTime<Utc>) -> Category {
        let draft = self.0;
        Category {
            id: draft.id.unwrap_or(id),
            name: draft.name,
            description: draft.description,
            checked: draft.checked,
            style: draft.style,
            creation_date: draft.creation_date.unwrap_or(now),
        }
    }

    pub fn into_draft(self) -> CategoryDraft {
        self.0
    }
}

impl TryFrom<CategoryDraft> for ValidatedCategory {
    type Error = CategoryValidationError;

    fn try_from(draft: CategoryDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

// =============================================================================
// QUERY/FILTER TYPES
// =============================================================================

/// How [`NameQuery::text`] is matched against category names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-sensitive substring, metacharacters match themselves
    #[default]
    Literal,
    /// Substring ignoring case
    CaseInsensitive,
    /// Raw regular expression, unanchored
    Pattern,
}

/// Name search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameQuery {
    pub text: String,
    #[serde(default)]
    pub mode: MatchMode,
}

impl NameQuery {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Literal,
        }
    }

    pub fn case_insensitive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::CaseInsensitive,
        }
    }

    pub fn pattern(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Pattern,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Reasons a [`CategoryDraft`] is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CategoryValidationError {
    #[error("category name must not be empty")]
    EmptyName,

    #[error("checked flag must be 0 or 1, got {0}")]
    InvalidChecked(i32),

    #[error("card font size must be a positive number, got {0}")]
    InvalidFontSize(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::lorem::en::Word;

    #[test]
    fn test_validate_accepts_minimal_draft() {
        let name: String = Word().fake();
        let validated = CategoryDraft::new(name.clone()).validate().unwrap();

        assert_eq!(validated.name(), name);
        assert_eq!(validated.description(), "");
        assert_eq!(validated.id(), None);
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let err = CategoryDraft::new("   ").validate().unwrap_err();
        assert_eq!(err, CategoryValidationError::EmptyName);
    }

    #[test]
    fn test_validate_rejects_checked_out_of_range() {
        let err = CategoryDraft::new("Books")
            .with_checked(2)
            .validate()
            .unwrap_err();
        assert_eq!(err, CategoryValidationError::InvalidChecked(2));
    }

    #[test]
    fn test_validate_rejects_bad_font_size() {
        for size in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let style = CategoryStyle {
                card_font_size: size,
                ..CategoryStyle::default()
            };
            let result = CategoryDraft::new("Books").with_style(style).validate();
            assert!(
                matches!(result, Err(CategoryValidationError::InvalidFontSize(_))),
                "font size {size} should be rejected"
            );
        }
    }

    #[test]
    fn test_into_category_keeps_explicit_fields() {
        let created = "2024-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap();
        let mut draft = CategoryDraft::new("Travel").with_id(7);
        draft.creation_date = Some(created);

        let category = draft.validate().unwrap().into_category(99, Utc::now());

        assert_eq!(category.id, 7);
        assert_eq!(category.creation_date, created);
    }

    #[test]
    fn test_into_category_fills_missing_fields() {
        let now = Utc::now();
        let category = CategoryDraft::new("Travel")
            .validate()
            .unwrap()
            .into_category(99, now);

        assert_eq!(category.id, 99);
        assert_eq!(category.creation_date, now);
    }

    #[test]
    fn test_zero_is_a_valid_id() {
        let category = CategoryDraft::new("Zero")
            .with_id(0)
            .validate()
            .unwrap()
            .into_category(5, Utc::now());
        assert_eq!(category.id, 0);
    }

    #[test]
    fn test_category_uses_stored_field_names() {
        let category = CategoryDraft::new("Programming")
            .with_id(1)
            .validate()
            .unwrap()
            .into_category(1, Utc::now());

        let json = serde_json::to_value(&category).unwrap();
        assert!(json.get("creationDate").is_some());
        assert_eq!(json["style"]["cardFontSize"], 14.0);
        assert!(json["style"].get("cardBackGroundColorClass").is_some());
        assert!(json["style"].get("cardForeGroundColor").is_some());
    }

    #[test]
    fn test_draft_deserializes_with_defaults() {
        let draft: CategoryDraft = serde_json::from_str(r#"{"name":"Music"}"#).unwrap();

        assert_eq!(draft.id, None);
        assert_eq!(draft.checked, 0);
        assert_eq!(draft.style, CategoryStyle::default());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_name_query_defaults_to_literal() {
        let query: NameQuery = serde_json::from_str(r#"{"text":"a.c"}"#).unwrap();
        assert_eq!(query, NameQuery::literal("a.c"));
    }
}
