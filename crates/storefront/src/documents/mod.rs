//! Schemaless document storage for the hosted collections.
//!
//! # Collections
//!
//! - `products` - catalogue, public read, admin write
//! - `orders` - placed orders, created by shoppers, status changed by admins
//! - `users` - profile documents keyed by the auth provider's uid
//!
//! # Backends
//!
//! - [`FirestoreClient`] - the hosted document database over REST
//! - [`MemoryDocumentStore`] - in-process store for tests and local demos
//!
//! Documents are plain JSON objects. The document id is never part of the
//! body; it travels alongside it in [`StoredDocument`].

mod firestore;
mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use firestore::FirestoreClient;
pub use memory::MemoryDocumentStore;

/// Document body: top-level field name to JSON value.
pub type Fields = Map<String, Value>;

/// The collections the storefront reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Orders,
    Users,
}

impl Collection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Users => "users",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document read back from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

impl StoredDocument {
    /// Body with the id folded in as an `"id"` field, ready to deserialize
    /// into a model that carries its id.
    #[must_use]
    pub fn into_value_with_id(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Value::Object(fields)
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filters plus an optional single-field ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    /// Every document in the collection, in backend order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Whether `fields` passes every filter.
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| fields.get(field) == Some(value))
    }
}

/// Errors that can occur when talking to a document backend.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Document store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Backend refused the call (missing or insufficient credentials).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// An update targeted a document that does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    /// Response or document body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A typed value did not have the expected shape.
    #[error("Malformed document value: {0}")]
    Malformed(String),
}

/// CRUD plus simple queries over schemaless collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document under a generated id and return the id.
    async fn create(&self, collection: Collection, fields: Fields)
    -> Result<String, DocumentStoreError>;

    /// Read one document. `Ok(None)` when it does not exist.
    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError>;

    /// Create or fully replace the document at `id`.
    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentStoreError>;

    /// Merge top-level `fields` into an existing document.
    ///
    /// Fails with [`DocumentStoreError::NotFound`] when the document is absent.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentStoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), DocumentStoreError>;

    /// Documents matching `query`.
    async fn list(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, DocumentStoreError>;

    /// Cheap reachability check used by readiness.
    async fn ping(&self) -> Result<(), DocumentStoreError> {
        self.get(Collection::Products, "__readiness__").await.map(|_| ())
    }
}

/// Convert a serializable payload into a document body.
///
/// # Errors
///
/// Returns an error if the payload does not serialize to a JSON object.
pub fn to_fields<T: serde::Serialize>(payload: &T) -> Result<Fields, DocumentStoreError> {
    match serde_json::to_value(payload)? {
        Value::Object(fields) => Ok(fields),
        other => Err(DocumentStoreError::Malformed(format!(
            "expected an object, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_query_matches_all_filters() {
        let query = Query::all().where_eq("userId", "u1").where_eq("status", "pending");
        let Value::Object(hit) = json!({"userId": "u1", "status": "pending", "total": 3})
        else {
            unreachable!()
        };
        let Value::Object(miss) = json!({"userId": "u1", "status": "shipped"}) else {
            unreachable!()
        };
        assert!(query.matches(&hit));
        assert!(!query.matches(&miss));
        assert!(Query::all().matches(&miss));
    }

    #[test]
    fn test_into_value_with_id() {
        let doc = StoredDocument {
            id: "abc".to_string(),
            fields: to_fields(&json!({"name": "Lamp"})).unwrap(),
        };
        assert_eq!(doc.into_value_with_id(), json!({"name": "Lamp", "id": "abc"}));
    }

    #[test]
    fn test_to_fields_rejects_scalars() {
        assert!(matches!(
            to_fields(&42),
            Err(DocumentStoreError::Malformed(_))
        ));
    }
}
