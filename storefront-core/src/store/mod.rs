//! Remote document store clients.
//!
//! The store holds named collections of JSON documents plus singleton
//! documents addressed by path. Identifiers are opaque strings assigned by
//! the store.
//!
//! Two clients are provided:
//! - [`MemoryStore`]: in-process store with change notifications, used for
//!   tests and offline work
//! - [`HttpStore`]: REST client with a WebSocket snapshot listener

mod error;
mod http;
mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::StoreError;
pub use http::HttpStore;
pub use memory::{MemoryStore, Operation};

/// Document fields, excluding the identifier.
pub type Fields = serde_json::Map<String, Value>;

/// A stream of full collection snapshots, one per change.
pub type Snapshots = BoxStream<'static, Result<Vec<RawDocument>, StoreError>>;

/// A document as stored: identifier plus untyped fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decodes into an entity, injecting the identifier as the `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// Client contract for the hosted document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns every document in the collection, in store order.
    async fn get_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError>;

    /// Creates a document and returns it with its assigned identifier.
    async fn add(&self, collection: &str, fields: Fields) -> Result<RawDocument, StoreError>;

    /// Merges `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Starts a listener. The first item is the current snapshot; a new
    /// snapshot follows every change to the collection.
    async fn subscribe(&self, collection: &str) -> Result<Snapshots, StoreError>;

    /// Reads a singleton document. Absent documents are `Ok(None)`.
    async fn get_document(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrites a singleton document.
    async fn set_document(&self, path: &str, value: Value) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    #[test]
    fn test_decode_injects_id() {
        let fields = json!({"name": "Widget", "id": "stale"})
            .as_object()
            .cloned()
            .unwrap();
        let doc = RawDocument::new("abc", fields);

        let named: Named = doc.decode().unwrap();
        assert_eq!(named.id, "abc");
        assert_eq!(named.name, "Widget");
    }

    #[test]
    fn test_raw_document_flattens_fields() {
        let doc: RawDocument = serde_json::from_value(json!({"id": "abc", "name": "Widget"})).unwrap();
        assert_eq!(doc.id, "abc");
        assert_eq!(doc.fields.get("name"), Some(&json!("Widget")));
        assert!(!doc.fields.contains_key("id"));
    }
}
