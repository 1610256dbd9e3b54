use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

mod id;
pub mod location;
pub mod question;

pub use id::{InvalidRecordId, RECORD_ID_LEN, RecordId};
pub use location::{
    Location, LocationCount, LocationCountQuery, LocationImage, LocationListQuery, LocationPatch,
    LocationPayload, LocationView, Score,
};
pub use question::{
    Question, QuestionListQuery, QuestionOption, QuestionPatch, QuestionPayload, QuestionView,
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Document
///
/// The contract every CRUD-managed resource fulfils. The persisted record is a plain
/// struct; this trait attaches the behaviour the controller needs: construction from a
/// request body, shallow merge, and the projection to the public view.
pub trait Document: Clone + Send + Sync + 'static {
    /// Body accepted by create and replace.
    type Payload: Send;
    /// Body accepted by update; every field optional.
    type Patch: Send;
    /// Public projection returned to clients.
    type View: Serialize + Send;

    /// Human-facing name used in error messages ("Question does not exist").
    const KIND: &'static str;
    /// The field carrying the unique index.
    const UNIQUE_FIELD: &'static str;

    fn id(&self) -> &RecordId;
    /// Value of [`Document::UNIQUE_FIELD`].
    fn unique_key(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;

    /// Builds a fresh record from a validated body.
    fn from_payload(
        id: RecordId,
        payload: Self::Payload,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self;

    /// Copies every provided field of `patch` over `self`.
    fn merge(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    fn transform(&self) -> Self::View;
}

/// ListOptions
///
/// Resolved pagination and filter for a list call. The filter is an exact match on the
/// resource's unique field; absent or empty filters are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page: u32,
    pub per_page: u32,
    pub filter: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            filter: None,
        }
    }
}

impl ListOptions {
    pub fn new(page: Option<u32>, per_page: Option<u32>, filter: Option<String>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE),
            filter: filter.filter(|value| !value.is_empty()),
        }
    }

    /// Rows skipped before the page starts: `perPage * (page - 1)`.
    pub fn skip(&self) -> i64 {
        i64::from(self.per_page) * i64::from(self.page.saturating_sub(1))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// True when `key` passes the filter.
    pub fn matches(&self, key: &str) -> bool {
        self.filter.as_deref().is_none_or(|wanted| wanted == key)
    }
}

/// Deserializes an optional free-text field with surrounding whitespace removed, so
/// length rules run against the stored form.
pub(crate) fn trim_optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|text| text.trim().to_string()))
}
