use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DocumentStore;
use crate::{
    error::StoreError,
    models::{Document, ListOptions, RecordId},
};

/// InMemoryStore
///
/// A `DocumentStore` over a map guarded by an async `RwLock`. It enforces the same
/// unique-field rule as the Postgres schema, which makes it a drop-in for handler and
/// HTTP tests and for running the API without a database.
pub struct InMemoryStore<D> {
    docs: RwLock<HashMap<RecordId, D>>,
}

impl<D> InMemoryStore<D> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }
}

impl<D> Default for InMemoryStore<D> {
    fn default() -> Self {
        Self::new()
    }
}

// True when another record already holds `doc`'s unique value.
fn duplicates<D: Document>(docs: &HashMap<RecordId, D>, doc: &D) -> bool {
    docs.values()
        .any(|other| other.id() != doc.id() && other.unique_key() == doc.unique_key())
}

#[async_trait]
impl<D: Document> DocumentStore<D> for InMemoryStore<D> {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<D>, StoreError> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn list(&self, options: &ListOptions) -> Result<Vec<D>, StoreError> {
        let docs = self.docs.read().await;

        let mut matching: Vec<&D> = docs
            .values()
            .filter(|doc| options.matches(doc.unique_key()))
            .collect();

        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(a.id()))
        });

        Ok(matching
            .into_iter()
            .skip(options.skip().max(0) as usize)
            .take(options.limit().max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: Option<&str>) -> Result<i64, StoreError> {
        let docs = self.docs.read().await;
        let count = docs
            .values()
            .filter(|doc| filter.is_none_or(|wanted| wanted == doc.unique_key()))
            .count();
        Ok(count as i64)
    }

    async fn insert(&self, doc: &D) -> Result<D, StoreError> {
        let mut docs = self.docs.write().await;
        if duplicates(&docs, doc) {
            return Err(StoreError::Conflict(D::UNIQUE_FIELD));
        }
        docs.insert(doc.id().clone(), doc.clone());
        Ok(doc.clone())
    }

    async fn upsert(&self, doc: &D) -> Result<D, StoreError> {
        // Same write path as insert; an existing entry is simply overwritten.
        self.insert(doc).await
    }

    async fn save(&self, doc: &D) -> Result<Option<D>, StoreError> {
        let mut docs = self.docs.write().await;
        if !docs.contains_key(doc.id()) {
            return Ok(None);
        }
        if duplicates(&docs, doc) {
            return Err(StoreError::Conflict(D::UNIQUE_FIELD));
        }
        docs.insert(doc.id().clone(), doc.clone());
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError> {
        Ok(self.docs.write().await.remove(id).is_some())
    }
}
