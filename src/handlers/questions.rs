use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    auth::AdminUser,
    controller,
    error::{ApiResult, ErrorBody},
    models::{ListOptions, QuestionListQuery, QuestionPatch, QuestionPayload, QuestionView},
    repository::QuestionStore,
    validation::{IdParam, ValidatedJson, ValidatedPath, ValidatedQuery},
};

/// list_questions
///
/// [User] Lists questions newest first, optionally filtered by exact title.
#[utoipa::path(
    get,
    path = "/v1/questions",
    tag = "questions",
    params(QuestionListQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Questions", body = [QuestionView]),
        (status = 400, description = "Invalid pagination", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn list_questions(
    State(store): State<QuestionStore>,
    ValidatedQuery(query): ValidatedQuery<QuestionListQuery>,
) -> ApiResult<Json<Vec<QuestionView>>> {
    let options = ListOptions::new(query.page, query.per_page, query.title);
    controller::list(&*store, options).await.map(Json)
}

/// create_question
///
/// [Admin] Creates a question. A duplicate title is answered with 409.
#[utoipa::path(
    post,
    path = "/v1/questions",
    tag = "questions",
    request_body = QuestionPayload,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = QuestionView),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Admins only", body = ErrorBody),
        (status = 409, description = "Title already exists", body = ErrorBody)
    )
)]
pub async fn create_question(
    _admin: AdminUser,
    State(store): State<QuestionStore>,
    ValidatedJson(payload): ValidatedJson<QuestionPayload>,
) -> ApiResult<(StatusCode, Json<QuestionView>)> {
    let question = controller::create(&*store, payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// get_question
///
/// [Admin] Fetches one question. Malformed and unknown ids both give 404.
#[utoipa::path(
    get,
    path = "/v1/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question id (24 hex characters)")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Found", body = QuestionView),
        (status = 403, description = "Admins only", body = ErrorBody),
        (status = 404, description = "Question does not exist", body = ErrorBody)
    )
)]
pub async fn get_question(
    _admin: AdminUser,
    State(store): State<QuestionStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<QuestionView>> {
    let question = controller::load(&*store, &id).await?;
    Ok(Json(controller::get(&question)))
}

/// replace_question
///
/// [User] Replaces every field but the id.
#[utoipa::path(
    put,
    path = "/v1/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question id (24 hex characters)")),
    request_body = QuestionPayload,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Replaced", body = QuestionView),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Question does not exist", body = ErrorBody),
        (status = 409, description = "Title already exists", body = ErrorBody)
    )
)]
pub async fn replace_question(
    State(store): State<QuestionStore>,
    ValidatedPath(params): ValidatedPath<IdParam>,
    ValidatedJson(payload): ValidatedJson<QuestionPayload>,
) -> ApiResult<Json<QuestionView>> {
    let question = controller::load(&*store, &params.id).await?;
    controller::replace(&*store, question, payload).await.map(Json)
}

/// update_question
///
/// [User] Merges the provided fields into the question.
#[utoipa::path(
    patch,
    path = "/v1/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question id (24 hex characters)")),
    request_body = QuestionPatch,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = QuestionView),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "Question does not exist", body = ErrorBody),
        (status = 409, description = "Title already exists", body = ErrorBody)
    )
)]
pub async fn update_question(
    State(store): State<QuestionStore>,
    ValidatedPath(params): ValidatedPath<IdParam>,
    ValidatedJson(patch): ValidatedJson<QuestionPatch>,
) -> ApiResult<Json<QuestionView>> {
    let question = controller::load(&*store, &params.id).await?;
    controller::update(&*store, question, patch).await.map(Json)
}

/// delete_question
///
/// [Admin] Hard-deletes the question.
#[utoipa::path(
    delete,
    path = "/v1/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question id (24 hex characters)")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admins only", body = ErrorBody),
        (status = 404, description = "Question does not exist", body = ErrorBody)
    )
)]
pub async fn delete_question(
    _admin: AdminUser,
    State(store): State<QuestionStore>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let question = controller::load(&*store, &id).await?;
    controller::remove(&*store, question).await?;
    Ok(StatusCode::NO_CONTENT)
}
