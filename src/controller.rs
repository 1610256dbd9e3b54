//! Resource operations shared by every collection.
//!
//! Handlers resolve auth and validation, then call into here. The record loaded by
//! [`load`] is passed explicitly to the operations that act on it.

use chrono::Utc;

use crate::{
    error::{ApiError, ApiResult},
    models::{Document, ListOptions, RecordId},
    repository::DocumentStore,
};

/// Fetches the record addressed by a raw `:id` segment.
/// A malformed id is reported exactly like a missing record.
pub async fn load<D: Document>(store: &dyn DocumentStore<D>, raw_id: &str) -> ApiResult<D> {
    let Ok(id) = raw_id.parse::<RecordId>() else {
        return Err(ApiError::NotFound(D::KIND));
    };

    store
        .find_by_id(&id)
        .await?
        .ok_or(ApiError::NotFound(D::KIND))
}

pub fn get<D: Document>(doc: &D) -> D::View {
    doc.transform()
}

pub async fn create<D: Document>(
    store: &dyn DocumentStore<D>,
    payload: D::Payload,
) -> ApiResult<D::View> {
    let now = Utc::now();
    let doc = D::from_payload(RecordId::generate(), payload, now, now);

    let saved = store.insert(&doc).await?;
    tracing::info!(kind = D::KIND, id = %saved.id(), "Created record");

    Ok(saved.transform())
}

/// Full replacement under the same id. When the record was deleted after `existing`
/// was loaded, the upsert recreates it.
pub async fn replace<D: Document>(
    store: &dyn DocumentStore<D>,
    existing: D,
    payload: D::Payload,
) -> ApiResult<D::View> {
    let replacement = D::from_payload(
        existing.id().clone(),
        payload,
        existing.created_at(),
        Utc::now(),
    );

    store.upsert(&replacement).await?;

    let saved = store
        .find_by_id(existing.id())
        .await?
        .ok_or(ApiError::NotFound(D::KIND))?;

    Ok(saved.transform())
}

/// Shallow merge of `patch` onto `existing`.
pub async fn update<D: Document>(
    store: &dyn DocumentStore<D>,
    mut existing: D,
    patch: D::Patch,
) -> ApiResult<D::View> {
    existing.merge(patch, Utc::now());

    let saved = store
        .save(&existing)
        .await?
        .ok_or(ApiError::NotFound(D::KIND))?;

    Ok(saved.transform())
}

pub async fn list<D: Document>(
    store: &dyn DocumentStore<D>,
    options: ListOptions,
) -> ApiResult<Vec<D::View>> {
    let docs = store.list(&options).await?;
    Ok(docs.iter().map(D::transform).collect())
}

pub async fn count<D: Document>(
    store: &dyn DocumentStore<D>,
    filter: Option<String>,
) -> ApiResult<i64> {
    let filter = filter.filter(|value| !value.is_empty());
    Ok(store.count(filter.as_deref()).await?)
}

pub async fn remove<D: Document>(store: &dyn DocumentStore<D>, existing: D) -> ApiResult<()> {
    let removed = store.delete(existing.id()).await?;
    tracing::info!(kind = D::KIND, id = %existing.id(), removed, "Deleted record");
    Ok(())
}
