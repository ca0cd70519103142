//! crates/scoping_core/src/memory_store.rs
//!
//! A process-local implementation of the `DocumentStore` port.
//!
//! Ordering and filtering compare the text form of a field (strings as-is, other
//! JSON values as their JSON rendering), byte-wise, which matches what the
//! Postgres adapter does with `->>` and the "C" collation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::ports::{merge_documents, Document, DocumentStore, ListQuery, PortError, PortResult};

/// The text a field is ordered and filtered by; `None` for missing or null fields.
fn field_text(document: &Document, field: &str) -> Option<String> {
    match document.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

type Collection = BTreeMap<String, Document>;

/// Document store backed by nested ordered maps behind an async lock.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> PortResult<Document> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("{collection}/{id}")))
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> PortResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Document) -> PortResult<Document> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        merge_documents(stored, patch);
        Ok(stored.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> PortResult<()> {
        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> PortResult<Vec<(String, Document)>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<(Option<String>, &String, &Document)> = docs
            .iter()
            .filter(|(_, doc)| match &query.filter {
                Some(filter) => field_text(doc, &filter.field).as_deref() == Some(filter.value.as_str()),
                None => true,
            })
            .filter_map(|(id, doc)| match &query.order_by {
                Some(field) => field_text(doc, field).map(|key| (Some(key), id, doc)),
                None => Some((None, id, doc)),
            })
            .collect();

        // BTreeMap iteration already yields id order; a stable sort keeps it for ties.
        matching.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|(_, id, doc)| (id.clone(), doc.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Page;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("test documents must be objects"),
        }
    }

    #[tokio::test]
    async fn merge_creates_missing_documents() {
        let store = InMemoryDocumentStore::new();
        let merged = store
            .merge("users", "1", doc(json!({ "name": "Ann" })))
            .await
            .unwrap();
        assert_eq!(Value::Object(merged), json!({ "name": "Ann" }));
        assert_eq!(store.len("users").await, 1);
    }

    #[tokio::test]
    async fn get_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        assert!(matches!(
            store.get("users", "nope").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        store.set("users", "1", doc(json!({ "name": "Ann" }))).await.unwrap();

        store.delete("users", "1").await.unwrap();
        store.delete("users", "1").await.unwrap();
        store.delete("never-created", "1").await.unwrap();

        assert_eq!(store.len("users").await, 0);
    }

    #[tokio::test]
    async fn list_orders_filters_and_paginates() {
        let store = InMemoryDocumentStore::new();
        store.set("c", "1", doc(json!({ "k": "b", "t": "x" }))).await.unwrap();
        store.set("c", "2", doc(json!({ "k": "a", "t": "y" }))).await.unwrap();
        store.set("c", "3", doc(json!({ "k": "c", "t": "x" }))).await.unwrap();
        store.set("c", "4", doc(json!({ "t": "x" }))).await.unwrap();

        let ids = |rows: Vec<(String, Document)>| rows.into_iter().map(|(id, _)| id).collect::<Vec<_>>();

        let first_page = store
            .list("c", &ListQuery::ordered_by("k", Page { number: 1, size: 2 }))
            .await
            .unwrap();
        assert_eq!(ids(first_page), vec!["2", "1"]);

        let second_page = store
            .list("c", &ListQuery::ordered_by("k", Page { number: 2, size: 2 }))
            .await
            .unwrap();
        assert_eq!(ids(second_page), vec!["3"]);

        let beyond = store
            .list("c", &ListQuery::ordered_by("k", Page { number: 5, size: 2 }))
            .await
            .unwrap();
        assert!(beyond.is_empty());

        let far_beyond = store
            .list(
                "c",
                &ListQuery::ordered_by("k", Page::from_query(Some("4294967295"), Some("4294967295"))),
            )
            .await
            .unwrap();
        assert!(far_beyond.is_empty());

        let filtered = store
            .list(
                "c",
                &ListQuery::ordered_by("k", Page::default()).with_filter("t", "x"),
            )
            .await
            .unwrap();
        assert_eq!(ids(filtered), vec!["1", "3"]);
    }
}
