//! Firestore REST client.
//!
//! # Endpoints
//!
//! All paths are relative to
//! `{endpoint}/v1/projects/{project}/databases/{database}/documents`:
//!
//! - `POST /{collection}` - create with a generated id
//! - `GET /{collection}/{id}` - read
//! - `PATCH /{collection}/{id}` - full replace (no mask) or merge (with
//!   `updateMask.fieldPaths` and `currentDocument.exists=true`)
//! - `DELETE /{collection}/{id}` - delete
//! - `POST :runQuery` - structured query with equality filters and ordering
//!
//! Every call carries the web API key. When a service access token is
//! configured it is sent as a bearer token.

mod value;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::instrument;
use url::Url;

use self::value::{decode_fields, encode_fields, encode_value};
use super::{Collection, Direction, DocumentStore, DocumentStoreError, Fields, Query, StoredDocument};
use crate::config::FirebaseConfig;

/// Client for the hosted document database.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    documents_url: String,
    api_key: String,
    access_token: Option<SecretString>,
}

impl FirestoreClient {
    /// Create a new client for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing HTTP connection pool.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &FirebaseConfig) -> Self {
        let documents_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            config.firestore_endpoint.trim_end_matches('/'),
            config.project_id,
            config.database
        );

        Self {
            inner: Arc::new(FirestoreClientInner {
                client,
                documents_url,
                api_key: config.api_key.clone(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    fn url(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, DocumentStoreError> {
        let mut url = Url::parse(&format!("{}{path}", self.inner.documents_url))
            .map_err(|e| DocumentStoreError::Malformed(format!("invalid document URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.inner.api_key);
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.access_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and return the parsed body, or `None` on 404.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<Value>, DocumentStoreError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = %status, "Document store refused the request");
            return Err(DocumentStoreError::PermissionDenied(error_message(&response_text)));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Document store returned non-success status"
            );
            return Err(DocumentStoreError::Status {
                status: status.as_u16(),
                message: error_message(&response_text),
            });
        }

        if response_text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }

        serde_json::from_str(&response_text).map(Some).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse document store response"
            );
            DocumentStoreError::Parse(e)
        })
    }
}

/// Pull the human-readable message out of a REST error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Split a Firestore document resource into id and decoded body.
fn parse_document(document: &Value) -> Result<StoredDocument, DocumentStoreError> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentStoreError::Malformed("document without a name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    Ok(StoredDocument {
        id,
        fields: decode_fields(document.get("fields"))?,
    })
}

/// Build the `structuredQuery` body for [`Query`].
fn structured_query(collection: Collection, query: &Query) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": collection.as_str() }],
    });

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|(field, value)| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": encode_value(value),
                }
            })
        })
        .collect();

    let filter = match filters.len() {
        0 => None,
        1 => filters.into_iter().next(),
        _ => Some(json!({ "compositeFilter": { "op": "AND", "filters": filters } })),
    };
    if let Some(filter) = filter {
        structured["where"] = filter;
    }

    if let Some((field, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{ "field": { "fieldPath": field }, "direction": direction }]);
    }

    json!({ "structuredQuery": structured })
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    #[instrument(skip(self, fields), fields(collection = %collection))]
    async fn create(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, DocumentStoreError> {
        let url = self.url(&format!("/{collection}"), &[])?;
        let body = json!({ "fields": encode_fields(&fields) });
        let document = self
            .execute(self.inner.client.post(url).json(&body))
            .await?
            .ok_or_else(|| DocumentStoreError::Status {
                status: 404,
                message: format!("collection {collection} not found"),
            })?;
        Ok(parse_document(&document)?.id)
    }

    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<StoredDocument>, DocumentStoreError> {
        let url = self.url(&format!("/{collection}/{id}"), &[])?;
        self.execute(self.inner.client.get(url))
            .await?
            .map(|document| parse_document(&document))
            .transpose()
    }

    #[instrument(skip(self, fields), fields(collection = %collection, id = %id))]
    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentStoreError> {
        let url = self.url(&format!("/{collection}/{id}"), &[])?;
        let body = json!({ "fields": encode_fields(&fields) });
        self.execute(self.inner.client.patch(url).json(&body))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self, fields), fields(collection = %collection, id = %id))]
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentStoreError> {
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let url = self.url(&format!("/{collection}/{id}"), &params)?;
        let body = json!({ "fields": encode_fields(&fields) });
        match self.execute(self.inner.client.patch(url).json(&body)).await? {
            Some(_) => Ok(()),
            None => Err(DocumentStoreError::NotFound {
                collection,
                id: id.to_string(),
            }),
        }
    }

    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), DocumentStoreError> {
        let url = self.url(&format!("/{collection}/{id}"), &[])?;
        self.execute(self.inner.client.delete(url)).await.map(|_| ())
    }

    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn list(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<StoredDocument>, DocumentStoreError> {
        let url = self.url(":runQuery", &[])?;
        let body = structured_query(collection, query);
        let rows = self
            .execute(self.inner.client.post(url).json(&body))
            .await?
            .unwrap_or(Value::Null);

        // Each row carries at most one document; rows without one only report read time.
        rows.as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|row| row.get("document"))
            .map(parse_document)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> FirebaseConfig {
        FirebaseConfig {
            project_id: "oussaili-test".to_string(),
            api_key: "web-key".to_string(),
            database: "(default)".to_string(),
            firestore_endpoint: "http://localhost:8080/".to_string(),
            identity_endpoint: "http://localhost:9099".to_string(),
            secure_token_endpoint: "http://localhost:9099".to_string(),
            access_token: None,
        }
    }

    #[test]
    fn test_document_url_carries_key_and_mask() {
        let client = FirestoreClient::new(&config());
        let url = client
            .url("/users/u1", &[("updateMask.fieldPaths", "role"), ("currentDocument.exists", "true")])
            .unwrap();
        assert_eq!(url.path(), "/v1/projects/oussaili-test/databases/(default)/documents/users/u1");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(query[0], ("key".to_string(), "web-key".to_string()));
        assert!(query.contains(&("updateMask.fieldPaths".to_string(), "role".to_string())));
    }

    #[test]
    fn test_parse_document_takes_last_path_segment() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/products/abc123",
            "fields": { "name": { "stringValue": "Lamp" } },
        });
        let parsed = parse_document(&doc).unwrap();
        assert_eq!(parsed.id, "abc123");
        assert_eq!(parsed.fields["name"], "Lamp");
    }

    #[test]
    fn test_structured_query_single_filter_and_order() {
        let query = Query::all()
            .where_eq("userId", "u1")
            .order_by("createdAt", Direction::Descending);
        let body = structured_query(Collection::Orders, &query);
        let structured = &body["structuredQuery"];
        assert_eq!(structured["from"][0]["collectionId"], "orders");
        assert_eq!(structured["where"]["fieldFilter"]["op"], "EQUAL");
        assert_eq!(structured["where"]["fieldFilter"]["value"], json!({"stringValue": "u1"}));
        assert_eq!(structured["orderBy"][0]["direction"], "DESCENDING");
    }

    #[test]
    fn test_structured_query_combines_filters() {
        let query = Query::all().where_eq("role", "admin").where_eq("email", "a@b.co");
        let body = structured_query(Collection::Users, &query);
        let filter = &body["structuredQuery"]["where"]["compositeFilter"];
        assert_eq!(filter["op"], "AND");
        assert_eq!(filter["filters"].as_array().unwrap().len(), 2);
        assert!(body["structuredQuery"].get("orderBy").is_none());
    }

    #[test]
    fn test_unfiltered_query_has_no_where() {
        let body = structured_query(Collection::Products, &Query::all());
        assert!(body["structuredQuery"].get("where").is_none());
    }

    #[test]
    fn test_error_message_prefers_rest_error() {
        let body = r#"{"error":{"code":403,"message":"Missing or insufficient permissions."}}"#;
        assert_eq!(error_message(body), "Missing or insufficient permissions.");
        assert_eq!(error_message("gateway down"), "gateway down");
    }
}
