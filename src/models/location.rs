use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{Document, RecordId, trim_optional};

/// Score
///
/// A weighted factor attached to a location, e.g. `{ "factor": "nightlife", "score": 40 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, TS, ToSchema)]
#[ts(export)]
pub struct Score {
    #[validate(length(min = 1, max = 64))]
    pub factor: String,
    #[validate(range(min = -100.0, max = 100.0))]
    pub score: f64,
}

/// LocationImage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LocationImage {
    #[validate(length(min = 1, max = 64))]
    pub title: String,
    #[validate(
        length(max = 512),
        custom(function = "crate::validation::validate_image_url")
    )]
    pub image_url: String,
}

/// Location
///
/// Persisted record in the `locations` table. `scores` and `images` are JSONB columns.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Location {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub scores: Vec<Score>,
    #[sqlx(json)]
    pub images: Vec<LocationImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// LocationView
///
/// Public projection of a [`Location`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LocationView {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub scores: Vec<Score>,
    pub images: Vec<LocationImage>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// LocationPayload
///
/// Body of `POST /v1/locations` and `PUT /v1/locations/{id}`.
#[derive(Debug, Clone, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LocationPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default, deserialize_with = "trim_optional")]
    #[validate(length(min = 1, max = 512))]
    pub description: Option<String>,
    #[validate(length(min = 1), nested)]
    pub scores: Vec<Score>,
    #[validate(length(min = 1), nested)]
    pub images: Option<Vec<LocationImage>>,
}

/// LocationPatch
///
/// Body of `PATCH /v1/locations/{id}`. Only the provided fields are merged.
#[derive(Debug, Clone, Default, Deserialize, Validate, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LocationPatch {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "trim_optional")]
    #[validate(length(min = 1, max = 512))]
    pub description: Option<String>,
    #[validate(length(min = 1), nested)]
    pub scores: Option<Vec<Score>>,
    #[validate(length(min = 1), nested)]
    pub images: Option<Vec<LocationImage>>,
}

/// Query string of `GET /v1/locations`.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LocationListQuery {
    /// List page, starting at 1.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Locations per page (1-100, default 30).
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
    /// Exact name match.
    pub name: Option<String>,
}

/// Query string of `GET /v1/locations/count`.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationCountQuery {
    /// Exact name match.
    pub name: Option<String>,
}

/// Response of `GET /v1/locations/count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LocationCount {
    pub count: i64,
}

impl Document for Location {
    type Payload = LocationPayload;
    type Patch = LocationPatch;
    type View = LocationView;

    const KIND: &'static str = "Location";
    const UNIQUE_FIELD: &'static str = "name";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn unique_key(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_payload(
        id: RecordId,
        payload: LocationPayload,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: payload.name,
            description: payload.description,
            scores: payload.scores,
            images: payload.images.unwrap_or_default(),
            created_at,
            updated_at: now,
        }
    }

    fn merge(&mut self, patch: LocationPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(scores) = patch.scores {
            self.scores = scores;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        self.updated_at = now;
    }

    fn transform(&self) -> LocationView {
        LocationView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            scores: self.scores.clone(),
            images: self.images.clone(),
            created_at: self.created_at,
        }
    }
}
