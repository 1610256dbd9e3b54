use crate::{AppState, handlers::questions};
use axum::{Router, routing::get};

/// Question Router Module
///
/// Mounted under `/v1`. Minimum role per route:
/// - user: list, replace, update
/// - admin: create, get by id, delete
pub fn question_routes() -> Router<AppState> {
    Router::new()
        // GET /v1/questions?page=&perPage=&title=
        // POST /v1/questions
        .route(
            "/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        // GET/PUT/PATCH/DELETE /v1/questions/{id}
        // GET and DELETE resolve a malformed id as 404; PUT and PATCH reject it with 400
        // before the record is loaded.
        .route(
            "/questions/{id}",
            get(questions::get_question)
                .put(questions::replace_question)
                .patch(questions::update_question)
                .delete(questions::delete_question),
        )
}
