#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Document persistence for the Varun API.
//!
//! Every record (user, assessment, booking, ...) is a JSON object stored
//! in a named [`Collection`] and keyed by its string `id` field. Lookups
//! are conjunctions of top-level field equalities ([`Filter`]), optionally
//! sorted on one field ([`Sort`]).
//!
//! Two implementations of [`DocumentStore`] are provided:
//!
//! - [`sqlite::SqliteDocumentStore`]: a single `documents` table in
//!   `SQLite`, queried with `json_extract`.
//! - [`memory::MemoryDocumentStore`]: an in-process map, used by tests
//!   and for ephemeral deployments.

pub mod memory;
pub mod sqlite;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Errors from document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database query or command failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not an object or has no string `id`.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A document with the same `id` already exists in the collection.
    #[error("Duplicate id '{id}' in {collection}")]
    Duplicate {
        /// Collection the insert targeted.
        collection: Collection,
        /// The conflicting id.
        id: String,
    },

    /// Field names must be plain identifiers.
    #[error("Invalid field name: {0:?}")]
    InvalidField(String),
}

/// Named document collections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    /// Registered users.
    Users,
    /// Submitted site assessments.
    Assessments,
    /// Feasibility results computed for assessments.
    FeasibilityResults,
    /// Expert consultation bookings.
    Bookings,
    /// User notifications.
    Notifications,
    /// IoT sensor readings.
    IotReadings,
}

/// Conjunction of top-level field equalities. The empty filter matches
/// every document. Numbers compare by value; booleans only equal
/// booleans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Matches every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches documents whose `field` equals `value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(field, value)
    }

    /// Adds another equality condition.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// The `(field, value)` pairs of this filter.
    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether `doc` satisfies every condition. A `null` field never
    /// matches, as in SQL.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, value)| {
            doc.get(field)
                .is_some_and(|v| !v.is_null() && json_eq(v, value))
        })
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        self.conditions
            .iter()
            .try_for_each(|(field, _)| validate_field(field))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Single-field sort. Documents missing the field sort lowest; ties keep
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field to sort on.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

impl Sort {
    /// Ascending sort on `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    /// Descending sort on `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

/// Async document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document. The document must be a JSON object with a
    /// string `id` that is unique within the collection.
    async fn insert(&self, collection: Collection, doc: Document) -> Result<(), StoreError>;

    /// Returns the first matching document in insertion order.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError>;

    /// Returns up to `limit` matching documents.
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
        limit: u32,
    ) -> Result<Vec<Document>, StoreError>;

    /// Shallow-merges `set` into the first matching document. The `id` key
    /// of `set` is ignored. Returns whether a document matched.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        set: Document,
    ) -> Result<bool, StoreError>;

    /// Counts matching documents.
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;
}

/// Serializes `record` and inserts it.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization fails, the record is not an
/// object with a string `id`, or the insert fails.
pub async fn insert_record<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    collection: Collection,
    record: &T,
) -> Result<(), StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(doc) => store.insert(collection, doc).await,
        other => Err(StoreError::InvalidDocument(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Finds the first matching document and deserializes it.
///
/// # Errors
///
/// Returns [`StoreError`] if the lookup or deserialization fails.
pub async fn find_record<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    filter: &Filter,
) -> Result<Option<T>, StoreError> {
    store
        .find_one(collection, filter)
        .await?
        .map(|doc| serde_json::from_value(Value::Object(doc)))
        .transpose()
        .map_err(StoreError::from)
}

/// Finds matching documents and deserializes them.
///
/// # Errors
///
/// Returns [`StoreError`] if the lookup or deserialization fails.
pub async fn find_records<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    filter: &Filter,
    sort: Option<&Sort>,
    limit: u32,
) -> Result<Vec<T>, StoreError> {
    store
        .find(collection, filter, sort, limit)
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(Value::Object(doc)).map_err(StoreError::from))
        .collect()
}

/// Extracts the string `id` of a document.
pub(crate) fn document_id(doc: &Document) -> Result<String, StoreError> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| StoreError::InvalidDocument("missing string `id` field".to_string()))
}

/// Field names end up in `json_extract` paths, so only identifiers pass.
pub(crate) fn validate_field(field: &str) -> Result<(), StoreError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

/// Equality that treats `1` and `1.0` as the same number, as `SQLite` does.
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total order used for sorting: missing/null < booleans < numbers <
/// strings < everything else.
pub(crate) fn compare_json(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    const fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
pub(crate) mod conformance {
    //! Behavior every [`DocumentStore`] implementation must share.

    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    pub async fn exercise(store: &dyn DocumentStore) {
        let users = [
            json!({ "id": "u1", "name": "Asha", "email": "asha@example.com", "total_liters_saved": 1200.5 }),
            json!({ "id": "u2", "name": "Bala", "email": "bala@example.com", "total_liters_saved": 4000 }),
            json!({ "id": "u3", "name": "Chitra", "email": "chitra@example.com" }),
        ];
        for user in users {
            store.insert(Collection::Users, doc(user)).await.unwrap();
        }

        // Duplicate ids are rejected, other collections are independent.
        let dup = store
            .insert(Collection::Users, doc(json!({ "id": "u1", "name": "Again" })))
            .await;
        assert!(matches!(dup, Err(StoreError::Duplicate { .. })));
        store
            .insert(Collection::Bookings, doc(json!({ "id": "u1", "user_id": "u1" })))
            .await
            .unwrap();

        let missing_id = store
            .insert(Collection::Users, doc(json!({ "name": "No Id" })))
            .await;
        assert!(matches!(missing_id, Err(StoreError::InvalidDocument(_))));

        // find_one by field
        let found = store
            .find_one(Collection::Users, &Filter::eq("email", "bala@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["id"], "u2");
        assert!(
            store
                .find_one(Collection::Users, &Filter::eq("email", "nobody@example.com"))
                .await
                .unwrap()
                .is_none()
        );

        // Numbers compare by value
        let by_number = store
            .find_one(Collection::Users, &Filter::eq("total_liters_saved", 4000.0))
            .await
            .unwrap();
        assert_eq!(by_number.unwrap()["id"], "u2");

        // Sorted, limited
        let top = store
            .find(
                Collection::Users,
                &Filter::all(),
                Some(&Sort::desc("total_liters_saved")),
                2,
            )
            .await
            .unwrap();
        let ids: Vec<&str> = top.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["u2", "u1"]);

        let ascending = store
            .find(
                Collection::Users,
                &Filter::all(),
                Some(&Sort::asc("total_liters_saved")),
                10,
            )
            .await
            .unwrap();
        assert_eq!(ascending[0]["id"], "u3");

        // Unsorted keeps insertion order
        let all = store
            .find(Collection::Users, &Filter::all(), None, 100)
            .await
            .unwrap();
        let ids: Vec<&str> = all.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["u1", "u2", "u3"]);

        // Shallow update, id untouched
        let matched = store
            .update_one(
                Collection::Users,
                &Filter::eq("id", "u3"),
                doc(json!({ "id": "hijack", "language": "ta", "streak_days": 9 })),
            )
            .await
            .unwrap();
        assert!(matched);
        let updated = store
            .find_one(Collection::Users, &Filter::eq("id", "u3"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["language"], "ta");
        assert_eq!(updated["streak_days"], 9);
        assert_eq!(updated["name"], "Chitra");

        let unmatched = store
            .update_one(
                Collection::Users,
                &Filter::eq("id", "nope"),
                doc(json!({ "language": "hi" })),
            )
            .await
            .unwrap();
        assert!(!unmatched);

        // Counting, including multi-condition filters
        assert_eq!(store.count(Collection::Users, &Filter::all()).await.unwrap(), 3);
        assert_eq!(
            store
                .count(
                    Collection::Users,
                    &Filter::eq("name", "Chitra").and("language", "ta")
                )
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count(Collection::Notifications, &Filter::all())
                .await
                .unwrap(),
            0
        );

        // Booleans
        store
            .insert(
                Collection::Notifications,
                doc(json!({ "id": "n1", "user_id": "u1", "read": false })),
            )
            .await
            .unwrap();
        store
            .insert(
                Collection::Notifications,
                doc(json!({ "id": "n2", "user_id": "u1", "read": 0 })),
            )
            .await
            .unwrap();
        assert_eq!(
            store
                .count(Collection::Notifications, &Filter::eq("read", false))
                .await
                .unwrap(),
            1
        );
        let zero = store
            .find_one(Collection::Notifications, &Filter::eq("read", 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(zero["id"], "n2");
        assert_eq!(
            store
                .count(Collection::Notifications, &Filter::eq("read", true))
                .await
                .unwrap(),
            0
        );

        // Bad field names never reach the query
        let bad = store
            .find_one(Collection::Users, &Filter::eq("name') OR 1=1 --", "x"))
            .await;
        assert!(matches!(bad, Err(StoreError::InvalidField(_))));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_names() {
        assert_eq!(Collection::FeasibilityResults.to_string(), "feasibility_results");
        assert_eq!(
            "iot_readings".parse::<Collection>().unwrap(),
            Collection::IotReadings
        );
    }

    #[test]
    fn filter_matching() {
        let Value::Object(doc) = json!({ "id": "a", "n": 2, "flag": true }) else {
            unreachable!()
        };
        assert!(Filter::all().matches(&doc));
        assert!(Filter::eq("n", 2.0).and("flag", true).matches(&doc));
        assert!(!Filter::eq("n", 3).matches(&doc));
        assert!(!Filter::eq("missing", Value::Null).matches(&doc));
    }

    #[test]
    fn json_ordering() {
        let one = json!(1);
        let two = json!(2.5);
        let text = json!("a");
        assert_eq!(compare_json(Some(&one), Some(&two)), Ordering::Less);
        assert_eq!(compare_json(None, Some(&one)), Ordering::Less);
        assert_eq!(compare_json(Some(&text), Some(&two)), Ordering::Greater);
    }

    #[test]
    fn field_validation() {
        assert!(validate_field("total_liters_saved").is_ok());
        assert!(validate_field("").is_err());
        assert!(validate_field("a.b").is_err());
    }
}
