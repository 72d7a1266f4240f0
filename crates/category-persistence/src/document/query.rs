//! Filters and update descriptions understood by every document store backend.

use regex::Regex;
use serde_json::Value;

/// A stored document: a JSON object
pub type Document = serde_json::Map<String, Value>;

/// Field holding the integer primary key of every document
pub const PRIMARY_KEY: &str = "id";

/// Read the primary key of a document, if it has a valid one
pub fn document_key(document: &Document) -> Option<i64> {
    document.get(PRIMARY_KEY).and_then(Value::as_i64)
}

/// Document selection predicate.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Every document in the collection
    All,
    /// Field equals value; numbers compare by value
    Eq { field: String, value: Value },
    /// Field is a string matched by the pattern
    Matches { field: String, pattern: Regex },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Equality on [`PRIMARY_KEY`]
    pub fn by_key(key: i64) -> Self {
        Self::eq(PRIMARY_KEY, key)
    }

    pub fn matches_pattern(field: impl Into<String>, pattern: Regex) -> Self {
        Self::Matches {
            field: field.into(),
            pattern,
        }
    }

    /// Primary key this filter pins down, if it is an equality on it
    pub fn primary_key(&self) -> Option<i64> {
        match self {
            Self::Eq { field, value } if field == PRIMARY_KEY => value.as_i64(),
            _ => None,
        }
    }

    /// Evaluate the filter against one document
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => document
                .get(field)
                .is_some_and(|stored| values_equal(stored, value)),
            Self::Matches { field, pattern } => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|text| pattern.is_match(text)),
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l == r,
            _ => l.as_f64() == r.as_f64(),
        },
        _ => left == right,
    }
}

/// Field replacement applied by `find_one_and_update`.
#[derive(Debug, Clone, Default)]
pub struct Update {
    /// Fields written on both update and insert
    pub set: Document,
    /// Fields written only when an upsert inserts
    pub set_on_insert: Document,
}

impl Update {
    pub fn set(set: Document) -> Self {
        Self {
            set,
            set_on_insert: Document::new(),
        }
    }

    #[must_use]
    pub fn with_set_on_insert(mut self, fields: Document) -> Self {
        self.set_on_insert = fields;
        self
    }

    /// Overwrite the `set` fields of an existing document
    pub fn apply(&self, document: &mut Document) {
        for (field, value) in &self.set {
            document.insert(field.clone(), value.clone());
        }
    }

    /// Build the document an upsert inserts under `key`
    pub fn build_insert(&self, key: i64) -> Document {
        let mut document = Document::new();
        document.insert(PRIMARY_KEY.to_string(), Value::from(key));
        for (field, value) in &self.set_on_insert {
            document.insert(field.clone(), value.clone());
        }
        self.apply(&mut document);
        // the filter key wins over anything smuggled in through the update
        document.insert(PRIMARY_KEY.to_string(), Value::from(key));
        document
    }
}

/// Options for `find_one_and_update`
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Insert when nothing matches
    pub upsert: bool,
}

impl UpdateOptions {
    pub const fn upsert() -> Self {
        Self { upsert: true }
    }
}

/// Pre- and post-image of a `find_one_and_update` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Absent when the call inserted
    pub before: Option<Document>,
    /// Absent when nothing matched and upsert was off
    pub after: Option<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn test_eq_compares_numbers_by_value() {
        let document = doc(json!({ "id": 3, "size": 12.0 }));

        assert!(Filter::by_key(3).matches(&document));
        assert!(Filter::eq("size", 12).matches(&document));
        assert!(Filter::eq("id", 3.0).matches(&document));
        assert!(!Filter::by_key(4).matches(&document));
    }

    #[test]
    fn test_eq_on_missing_field_does_not_match() {
        let document = doc(json!({ "id": 1 }));
        assert!(!Filter::eq("name", "x").matches(&document));
    }

    #[test]
    fn test_pattern_filter_requires_string_field() {
        let filter = Filter::matches_pattern("name", Regex::new("ab").unwrap());

        assert!(filter.matches(&doc(json!({ "name": "xaby" }))));
        assert!(!filter.matches(&doc(json!({ "name": 42 }))));
        assert!(!filter.matches(&doc(json!({}))));
    }

    #[test]
    fn test_primary_key_only_for_id_equality() {
        assert_eq!(Filter::by_key(0).primary_key(), Some(0));
        assert_eq!(Filter::eq("name", "x").primary_key(), None);
        assert_eq!(Filter::All.primary_key(), None);
    }

    #[test]
    fn test_build_insert_layers_fields() {
        let update = Update::set(doc(json!({ "name": "new", "id": 99 })))
            .with_set_on_insert(doc(json!({ "name": "ignored", "checked": 0 })));

        let inserted = update.build_insert(5);

        assert_eq!(inserted["id"], 5);
        assert_eq!(inserted["name"], "new");
        assert_eq!(inserted["checked"], 0);
    }

    #[test]
    fn test_apply_leaves_other_fields() {
        let mut document = doc(json!({ "id": 1, "name": "old", "creationDate": "x" }));
        Update::set(doc(json!({ "name": "new" }))).apply(&mut document);

        assert_eq!(document["name"], "new");
        assert_eq!(document["creationDate"], "x");
        assert_eq!(document_key(&document), Some(1));
    }
}
