use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::{Document, ListOptions, Location, Question, RecordId},
};

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresRepository;

/// DocumentStore
///
/// The persistence contract for one resource collection. Handlers and the controller only
/// ever see this trait, so Postgres and the in-memory store are interchangeable.
///
/// Implementations must classify unique-index violations as [`StoreError::Conflict`].
#[async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<D>, StoreError>;

    /// Records matching `options.filter`, newest first, paginated.
    async fn list(&self, options: &ListOptions) -> Result<Vec<D>, StoreError>;

    async fn count(&self, filter: Option<&str>) -> Result<i64, StoreError>;

    async fn insert(&self, doc: &D) -> Result<D, StoreError>;

    /// Overwrites the record with `doc.id()`, inserting it when absent.
    async fn upsert(&self, doc: &D) -> Result<D, StoreError>;

    /// Persists changes to an existing record. `None` when it no longer exists.
    async fn save(&self, doc: &D) -> Result<Option<D>, StoreError>;

    /// Hard delete. Returns whether a record was removed.
    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError>;
}

pub type QuestionStore = Arc<dyn DocumentStore<Question>>;
pub type LocationStore = Arc<dyn DocumentStore<Location>>;
