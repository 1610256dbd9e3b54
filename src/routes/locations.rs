use crate::{AppState, handlers::locations};
use axum::{Router, routing::get};

/// Location Router Module
///
/// Mounted under `/v1`. Minimum role per route:
/// - user: list, count, replace, update
/// - admin: create, get by id, delete
pub fn location_routes() -> Router<AppState> {
    Router::new()
        // GET /v1/locations?page=&perPage=&name=
        // POST /v1/locations
        .route(
            "/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        // GET /v1/locations/count?name=
        // The static segment wins over `{id}`.
        .route("/locations/count", get(locations::count_locations))
        // GET/PUT/PATCH/DELETE /v1/locations/{id}
        .route(
            "/locations/{id}",
            get(locations::get_location)
                .put(locations::replace_location)
                .patch(locations::update_location)
                .delete(locations::delete_location),
        )
}
