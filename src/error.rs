use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// StoreError
///
/// Failures surfaced by a [`crate::repository::DocumentStore`]. Storage-specific conflict
/// signals are already classified here, so nothing above the repository inspects
/// driver error codes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A write would duplicate the value of a uniquely indexed field.
    #[error("duplicate value for unique field `{0}`")]
    Conflict(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Where a rejected value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum FieldLocation {
    Body,
    Query,
    Params,
}

/// FieldError
///
/// One entry of the `errors` array in a validation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub location: FieldLocation,
    pub messages: Vec<String>,
}

/// ErrorBody
///
/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

/// ApiError
///
/// Every failure a request can end in. Handlers return `ApiResult<T>` and forward
/// errors with `?`; [`IntoResponse`] is the single place mapping kinds to statuses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} does not exist")]
    NotFound(&'static str),

    #[error("Validation Error")]
    Validation(Vec<FieldError>),

    /// A translated duplicate-key violation.
    #[error("Validation Error")]
    Conflict(FieldError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Store(StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// A single-field validation failure.
    pub fn invalid(field: &str, location: FieldLocation, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError {
            field: field.to_string(),
            location,
            messages: vec![message.into()],
        }])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    /// Rewrites a duplicate-key conflict into the user-facing validation shape;
    /// every other store error passes through untouched.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => ApiError::Conflict(FieldError {
                field: field.to_string(),
                location: FieldLocation::Body,
                messages: vec![format!("\"{field}\" already exists")],
            }),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors) = match self {
            ApiError::Validation(errors) => ("Validation Error".to_string(), errors),
            ApiError::Conflict(error) => ("Validation Error".to_string(), vec![error]),
            ApiError::Store(err) => {
                // Details stay in the logs.
                tracing::error!(error = %err, "Request failed in the datastore");
                ("Internal Server Error".to_string(), vec![])
            }
            other => (other.to_string(), vec![]),
        };

        let body = ErrorBody {
            code: status.as_u16(),
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}
