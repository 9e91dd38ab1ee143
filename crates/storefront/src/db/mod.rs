//! Typed repositories over the document store.
//!
//! # Collections
//!
//! - `products` - [`ProductRepository`]
//! - `orders` - [`OrderRepository`]
//! - `users` - [`ProfileRepository`]
//!
//! Every product or order write is validated before it reaches the store.
//! Reads attach the document id and deserialize into the core models; a
//! document that no longer matches its model is reported as corrupt rather
//! than silently skipped.

pub mod orders;
pub mod products;
pub mod profiles;

pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use profiles::ProfileRepository;

use oussaili_core::ValidationErrors;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::documents::{DocumentStoreError, StoredDocument};

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Document store call failed.
    #[error("document store error: {0}")]
    Store(#[from] DocumentStoreError),

    /// Payload failed schema validation; nothing was written.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Stored document does not match its model.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Deserialize a stored document into a model carrying its id.
fn decode<T: DeserializeOwned>(document: StoredDocument) -> Result<T, RepositoryError> {
    let id = document.id.clone();
    serde_json::from_value(document.into_value_with_id())
        .map_err(|e| RepositoryError::DataCorruption(format!("document {id}: {e}")))
}

/// Promote the store's missing-document error to a repository `NotFound`.
fn not_found(err: DocumentStoreError) -> RepositoryError {
    match err {
        DocumentStoreError::NotFound { .. } => RepositoryError::NotFound,
        other => RepositoryError::Store(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use oussaili_core::Product;
    use serde_json::json;

    use super::*;
    use crate::documents::to_fields;

    #[test]
    fn test_decode_reports_corrupt_documents() {
        let document = StoredDocument {
            id: "p1".to_string(),
            fields: to_fields(&json!({"name": "Lamp"})).unwrap(),
        };
        let err = decode::<Product>(document).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(msg) if msg.contains("p1")));
    }
}
