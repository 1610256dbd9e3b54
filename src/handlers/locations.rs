use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    auth::AdminUser,
    controller,
    error::{ApiResult, ErrorBody},
    models::{
        ListOptions, LocationCount, LocationCountQuery, LocationListQuery, LocationPatch,
        LocationPayload, LocationView,
    },
    repository::LocationStore,
    validation::{IdParam, ValidatedJson, ValidatedPath, ValidatedQuery},
};

/// list_locations
///
/// [User] Lists locations newest first, optionally filtered by exact name.
#[utoipa::path(
    get,
    path = "/v1/locations",
    tag = "locations",
    params(LocationListQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Locations", body = [LocationView]),
        (status = 400, description = "Invalid pagination", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn list_locations(
    State(store): State<LocationStore>,
    ValidatedQuery(query): ValidatedQuery<LocationListQuery>,
) -> ApiResult<Json<Vec<LocationView>>> {
    let options = ListOptions::new(query.page, query.per_page, query.name);
    controller::list(&*store, options).await.map(Json)
}

/// count_locations
///
/// [User] Number of locations, optionally restricted to an exact name.
#[utoipa::path(
    get,
    path = "/v1/locations/count",
    tag = "locations",
    params(LocationCountQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Count", body = LocationCount),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn count_locations(
    State(store): State<LocationStore>,
    ValidatedQuery(query): ValidatedQuery<LocationCountQuery>,
) -> ApiResult<Json<LocationCount>> {
    let count = controller::count(&*store, query.name).await?;
    Ok(Json(LocationCount { count }))
}

/// create_location
///
/// [Admin] Creates a location. A duplicate name is answered with 409.
#[utoipa::path(
    post,
    path = "/v1/locations",
    tag = "locations",
    request_body = LocationPayload,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = LocationView),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 403, description = "Admins only", body = ErrorBody),
        (status = 409, description = "Name already exists", body = ErrorBody)
    )
)]
pub async fn create_location(
    _admin: AdminUser,
    State(store): State<LocationStore>,
    ValidatedJson(payload): ValidatedJson<LocationPayload>,
) -> ApiResult<(StatusCode, Json<LocationView>)> {
    let location = controller::create(&*store, payload).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// get_location
///
/// [Admin] Fetches one location.
#[utoipa::path(
    get,
    path = "/v1/locations/{id}",
    tag = "locations",
    params(("id" = String, Path, description = "Location id (24 hex characters)")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Found", body = LocationView),
        (status = 403, description = "Admins only", body = ErrorBody),
        (status = 404, description = "Location does not exist", body = ErrorBody)
    )
)]
pub async fn get_location(
    _admin: AdminUser,
    State(store): State<LocationStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<LocationView>> {
    let location = controller::load(&*store, &id).await?;
    Ok(Json(controller::get(&location)))
}

/// replace_location
///
/// [User] Replaces every field but the id.
#[utoipa::path(
    put,
    path = "/v1/locations/{id}",
    tag = "locations",
    params(("id" = String, Path, description = "Location id (24 hex characters)")),
    request_body = LocationPayload,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Replaced", body = LocationView),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Location does not exist", body = ErrorBody),
        (status = 409, description = "Name already exists", body = ErrorBody)
    )
)]
pub async fn replace_location(
    State(store): State<LocationStore>,
    ValidatedPath(params): ValidatedPath<IdParam>,
    ValidatedJson(payload): ValidatedJson<LocationPayload>,
) -> ApiResult<Json<LocationView>> {
    let location = controller::load(&*store, &params.id).await?;
    controller::replace(&*store, location, payload).await.map(Json)
}

/// update_location
///
/// [User] Merges the provided fields into the location.
#[utoipa::path(
    patch,
    path = "/v1/locations/{id}",
    tag = "locations",
    params(("id" = String, Path, description = "Location id (24 hex characters)")),
    request_body = LocationPatch,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = LocationView),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Location does not exist", body = ErrorBody),
        (status = 409, description = "Name already exists", body = ErrorBody)
    )
)]
pub async fn update_location(
    State(store): State<LocationStore>,
    ValidatedPath(params): ValidatedPath<IdParam>,
    ValidatedJson(patch): ValidatedJson<LocationPatch>,
) -> ApiResult<Json<LocationView>> {
    let location = controller::load(&*store, &params.id).await?;
    controller::update(&*store, location, patch).await.map(Json)
}

/// delete_location
///
/// [Admin] Hard-deletes the location.
#[utoipa::path(
    delete,
    path = "/v1/locations/{id}",
    tag = "locations",
    params(("id" = String, Path, description = "Location id (24 hex characters)")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admins only", body = ErrorBody),
        (status = 404, description = "Location does not exist", body = ErrorBody)
    )
)]
pub async fn delete_location(
    _admin: AdminUser,
    State(store): State<LocationStore>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let location = controller::load(&*store, &id).await?;
    controller::remove(&*store, location).await?;
    Ok(StatusCode::NO_CONTENT)
}
