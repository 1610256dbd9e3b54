use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{Document, RecordId, trim_optional};

/// QuestionOption
///
/// One selectable answer of a question. The image link is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuestionOption {
    #[validate(length(min = 1, max = 64))]
    pub title: String,
    #[validate(
        length(max = 512),
        custom(function = "crate::validation::validate_image_url")
    )]
    pub image_url: Option<String>,
}

impl QuestionOption {
    /// Placeholder stored when a question is created without options.
    pub fn placeholder() -> Self {
        Self {
            title: "test".to_string(),
            image_url: None,
        }
    }
}

/// Question
///
/// Persisted record in the `questions` table. `options` lives in a JSONB column.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Question {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub options: Vec<QuestionOption>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// QuestionView
///
/// Public projection of a [`Question`]; `updatedAt` is not exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuestionView {
    pub id: RecordId,
    pub title: String,
    pub description: Option<String>,
    pub options: Vec<QuestionOption>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// QuestionPayload
///
/// Body of `POST /v1/questions` and `PUT /v1/questions/{id}`.
#[derive(Debug, Clone, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuestionPayload {
    #[validate(length(min = 3, max = 100))]
    pub title: String,
    #[serde(default, deserialize_with = "trim_optional")]
    #[validate(length(min = 1, max = 512))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 4), nested)]
    pub options: Option<Vec<QuestionOption>>,
}

/// QuestionPatch
///
/// Body of `PATCH /v1/questions/{id}`. Only the provided fields are merged.
#[derive(Debug, Clone, Default, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuestionPatch {
    #[validate(length(min = 3, max = 100))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "trim_optional")]
    #[validate(length(min = 1, max = 512))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 4), nested)]
    pub options: Option<Vec<QuestionOption>>,
}

/// Query string of `GET /v1/questions`.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QuestionListQuery {
    /// List page, starting at 1.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Questions per page (1-100, default 30).
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Exact title match.
    pub title: Option<String>,
}

impl Document for Question {
    type Payload = QuestionPayload;
    type Patch = QuestionPatch;
    type View = QuestionView;

    const KIND: &'static str = "Question";
    const UNIQUE_FIELD: &'static str = "title";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn unique_key(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_payload(
        id: RecordId,
        payload: QuestionPayload,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: payload.title,
            description: payload.description,
            options: payload
                .options
                .unwrap_or_else(|| vec![QuestionOption::placeholder()]),
            created_at,
            updated_at: now,
        }
    }

    fn merge(&mut self, patch: QuestionPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(options) = patch.options {
            self.options = options;
        }
        self.updated_at = now;
    }

    fn transform(&self) -> QuestionView {
        QuestionView {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            options: self.options.clone(),
            created_at: self.created_at,
        }
    }
}
