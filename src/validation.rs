use std::{borrow::Cow, sync::LazyLock};

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::{
    error::{ApiError, FieldError, FieldLocation},
    models::RecordId,
};

// Accepts http(s) links and bare `www.` hosts; the host needs at least one dot.
static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://|www\.)[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.\S{2,}$")
        .expect("image url pattern is valid")
});

/// Custom rule for image links.
pub fn validate_image_url(value: &str) -> Result<(), ValidationError> {
    if IMAGE_URL.is_match(value) {
        return Ok(());
    }
    let mut error = ValidationError::new("url");
    error.message = Some(Cow::Borrowed("must be a valid http(s) url"));
    Err(error)
}

/// Custom rule for `:id` path segments.
pub fn validate_record_id(value: &str) -> Result<(), ValidationError> {
    if RecordId::is_well_formed(value) {
        return Ok(());
    }
    let mut error = ValidationError::new("record_id");
    error.message = Some(Cow::Borrowed("must be 24 hexadecimal characters"));
    Err(error)
}

/// IdParam
///
/// Path parameters of the routes that validate their `:id` before loading.
#[derive(Debug, Clone, serde::Deserialize, Validate)]
pub struct IdParam {
    #[validate(custom(function = "validate_record_id"))]
    pub id: String,
}

/// Flattens nested validator output into `{field, location, messages}` entries,
/// with camelCase dotted paths such as `options[1].imageUrl`.
pub fn field_errors(errors: &ValidationErrors, location: FieldLocation) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", location, &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(
    errors: &ValidationErrors,
    prefix: &str,
    location: FieldLocation,
    out: &mut Vec<FieldError>,
) {
    for (name, kind) in errors.errors() {
        let field = if prefix.is_empty() {
            camel_case(name)
        } else {
            format!("{prefix}.{}", camel_case(name))
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = list.iter().map(|error| describe(&field, error)).collect();
                out.push(FieldError {
                    field,
                    location,
                    messages,
                });
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &field, location, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{field}[{index}]"), location, out);
                }
            }
        }
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return format!("\"{field}\" {message}");
    }

    let param = |key: &str| error.params.get(key).map(|value| value.to_string());

    match (error.code.as_ref(), param("min"), param("max")) {
        ("length", Some(min), Some(max)) => {
            format!("\"{field}\" length must be between {min} and {max}")
        }
        ("length", Some(min), None) => format!("\"{field}\" length must be at least {min}"),
        ("length", None, Some(max)) => {
            format!("\"{field}\" length must be less than or equal to {max}")
        }
        ("range", Some(min), Some(max)) => format!("\"{field}\" must be between {min} and {max}"),
        ("range", Some(min), None) => format!("\"{field}\" must be greater than or equal to {min}"),
        ("range", None, Some(max)) => format!("\"{field}\" must be less than or equal to {max}"),
        (code, _, _) => format!("\"{field}\" failed the {code} rule"),
    }
}

/// ValidatedJson
///
/// `Json<T>` followed by `T::validate()`. Malformed bodies and rule violations both
/// reject with a 400 before the handler runs.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::invalid("body", FieldLocation::Body, rejection.body_text())
            })?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(field_errors(&errors, FieldLocation::Body)))?;

        Ok(Self(value))
    }
}

/// ValidatedQuery
///
/// `Query<T>` followed by `T::validate()`.
pub struct ValidatedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::invalid("query", FieldLocation::Query, rejection.body_text())
            })?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(field_errors(&errors, FieldLocation::Query)))?;

        Ok(Self(value))
    }
}

/// ValidatedPath
///
/// `Path<T>` followed by `T::validate()`.
pub struct ValidatedPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidatedPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::invalid("params", FieldLocation::Params, rejection.body_text())
            })?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(field_errors(&errors, FieldLocation::Params)))?;

        Ok(Self(value))
    }
}
