use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod spa;
pub mod validation;

pub mod routes;
use auth::AuthUser;
use error::ApiError;
use routes::{locations, public, questions};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryStore, LocationStore, PostgresRepository, QuestionStore};

/// ApiDoc
///
/// Generated OpenAPI document, served at `/api-docs/openapi.json` with a Swagger UI
/// at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::questions::list_questions, handlers::questions::create_question,
        handlers::questions::get_question, handlers::questions::replace_question,
        handlers::questions::update_question, handlers::questions::delete_question,
        handlers::locations::list_locations, handlers::locations::count_locations,
        handlers::locations::create_location, handlers::locations::get_location,
        handlers::locations::replace_location, handlers::locations::update_location,
        handlers::locations::delete_location
    ),
    components(
        schemas(
            models::QuestionView, models::QuestionPayload, models::QuestionPatch,
            models::QuestionOption, models::LocationView, models::LocationPayload,
            models::LocationPatch, models::Score, models::LocationImage, models::LocationCount,
            models::RecordId, error::ErrorBody, error::FieldError, error::FieldLocation,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "questions", description = "Question resources"),
        (name = "locations", description = "Location resources")
    )
)]
struct ApiDoc;

/// Registers the `bearer` security scheme referenced by every `/v1` path.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Shared by every request: one store per resource collection plus the immutable
/// configuration. Handlers pull out only what they need via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub questions: QuestionStore,
    pub locations: LocationStore,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for QuestionStore {
    fn from_ref(app_state: &AppState) -> QuestionStore {
        app_state.questions.clone()
    }
}

impl FromRef<AppState> for LocationStore {
    fn from_ref(app_state: &AppState) -> LocationStore {
        app_state.locations.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards every `/v1` route. Extracting `AuthUser` rejects unauthenticated requests with
/// 401 before any validation or handler code runs; on success the identity is stored in
/// the request extensions so handler-level extractors reuse it.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies middleware and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Resource routes, all behind the bearer token. Unknown `/v1` paths answer with a
    // JSON 404 instead of falling through to the SPA shell.
    let v1_routes = Router::new()
        .merge(questions::question_routes())
        .merge(locations::location_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .fallback(|| async { ApiError::NotFound("Resource") });

    let mut base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/v1", v1_routes);

    if let Some(dir) = &state.config.static_dir {
        tracing::info!(dir = %dir, "Serving SPA shell");
        base_router = base_router.fallback_service(spa::spa_service(dir));
    }

    base_router
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with the `x-request-id` set by `SetRequestIdLayer`
/// so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
