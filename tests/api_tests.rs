use chrono::TimeDelta;
use reqwest::{Client, RequestBuilder, StatusCode};
use sarpe_api::{
    AppConfig, AppState, InMemoryStore,
    auth::{Role, issue_token},
    config::Env,
    create_router,
    models::{Location, LocationView, Question, QuestionView},
};
use serde_json::{Value, json};
use std::{path::Path, sync::Arc};
use tokio::net::TcpListener;

const TEST_JWT_SECRET: &str = "api-test-secret";

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub user_token: String,
    pub admin_token: String,
}

impl TestApp {
    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{}", self.address, path))
    }

    fn as_user(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.user_token)
    }

    fn as_admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.admin_token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

async fn spawn_app_with(config: AppConfig) -> TestApp {
    let state = AppState {
        questions: Arc::new(InMemoryStore::<Question>::new()),
        locations: Arc::new(InMemoryStore::<Location>::new()),
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().expect("bound address").port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server runs");
    });

    let sign = |role| {
        issue_token(TEST_JWT_SECRET, "5f7c1a2b3c4d5e6f7a8b9c0d", role, TimeDelta::hours(1))
            .expect("token is signed")
    };

    TestApp {
        address,
        client: Client::new(),
        user_token: sign(Role::User),
        admin_token: sign(Role::Admin),
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(AppConfig {
        env: Env::Production,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    })
    .await
}

fn volcano_hike() -> Value {
    json!({
        "name": "Volcano Hike",
        "description": "A steep climb to the crater rim",
        "scores": [
            { "factor": "adventure", "score": 90 },
            { "factor": "relaxation", "score": -20 }
        ],
        "images": [
            { "title": "Crater", "imageUrl": "https://example.com/crater.jpg" }
        ]
    })
}

async fn create_location(app: &TestApp, body: &Value) -> LocationView {
    let response = app
        .as_admin(app.client.post(app.url("/v1/locations")))
        .json(body)
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("location view")
}

// --- Public Surface ---

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app.get("/health").send().await.expect("req fail");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn test_openapi_document_lists_resources_and_bearer_scheme() {
    let app = spawn_app().await;

    let doc: Value = app
        .get("/api-docs/openapi.json")
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .expect("openapi json");

    assert!(doc["paths"].get("/v1/questions").is_some());
    assert!(doc["paths"].get("/v1/locations/count").is_some());
    assert_eq!(doc["components"]["securitySchemes"]["bearer"]["scheme"], "bearer");
}

// --- Authentication & Authorization ---

#[tokio::test]
async fn test_missing_token_is_401_before_validation() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/v1/questions"))
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body, json!({ "code": 401, "message": "Unauthorized" }));
}

#[tokio::test]
async fn test_user_cannot_reach_admin_routes() {
    let app = spawn_app().await;

    let response = app
        .as_user(app.client.post(app.url("/v1/locations")))
        .json(&volcano_hike())
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let created = create_location(&app, &volcano_hike()).await;

    for request in [
        app.client.get(app.url(&format!("/v1/locations/{}", created.id))),
        app.client.delete(app.url(&format!("/v1/locations/{}", created.id))),
    ] {
        let response = app.as_user(request).send().await.expect("req fail");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_role_header_bypass_when_enabled() {
    let app = spawn_app_with(AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        auth_dev_bypass: true,
        ..AppConfig::default()
    })
    .await;

    let response = app
        .client
        .post(app.url("/v1/questions"))
        .header("x-user-role", "admin")
        .json(&json!({ "title": "Favourite season?" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_role_header_alone_is_401_by_default() {
    // Local env, bypass left at its default.
    let app = spawn_app_with(AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    })
    .await;

    let response = app
        .client
        .post(app.url("/v1/questions"))
        .header("x-user-role", "admin")
        .json(&json!({ "title": "Favourite season?" }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// --- Locations ---

#[tokio::test]
async fn test_location_lifecycle() {
    let app = spawn_app().await;

    // Create
    let created = create_location(&app, &volcano_hike()).await;
    assert_eq!(created.name, "Volcano Hike");
    assert_eq!(created.id.as_str().len(), 24);
    assert_eq!(created.scores.len(), 2);

    // Read back
    let response = app
        .as_admin(app.get(&format!("/v1/locations/{}", created.id)))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("view json");
    assert_eq!(body["images"][0]["imageUrl"], "https://example.com/crater.jpg");
    assert!(body.get("createdAt").is_some());
    assert!(body.get("updatedAt").is_none());

    // Count by name
    let count: Value = app
        .as_user(app.get("/v1/locations/count?name=Volcano%20Hike"))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .expect("count json");
    assert_eq!(count, json!({ "count": 1 }));

    // Patch
    let response = app
        .as_user(app.client.patch(app.url(&format!("/v1/locations/{}", created.id))))
        .json(&json!({ "description": "Bring water" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let patched: LocationView = response.json().await.expect("view json");
    assert_eq!(patched.description.as_deref(), Some("Bring water"));
    assert_eq!(patched.images, created.images);

    // Replace drops the images it does not repeat
    let response = app
        .as_user(app.client.put(app.url(&format!("/v1/locations/{}", created.id))))
        .json(&json!({
            "name": "Volcano Hike",
            "scores": [{ "factor": "adventure", "score": 95 }]
        }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let replaced: LocationView = response.json().await.expect("view json");
    assert_eq!(replaced.id, created.id);
    assert!(replaced.images.is_empty());
    assert_eq!(replaced.description, None);

    // Delete, then the record is gone
    let response = app
        .as_admin(app.client.delete(app.url(&format!("/v1/locations/{}", created.id))))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .as_admin(app.get(&format!("/v1/locations/{}", created.id)))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["message"], "Location does not exist");
}

#[tokio::test]
async fn test_duplicate_location_name_is_409() {
    let app = spawn_app().await;
    create_location(&app, &volcano_hike()).await;

    let response = app
        .as_admin(app.client.post(app.url("/v1/locations")))
        .json(&volcano_hike())
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["errors"][0]["field"], "name");
    assert_eq!(body["errors"][0]["messages"][0], "\"name\" already exists");
}

// --- Questions ---

#[tokio::test]
async fn test_question_validation_errors() {
    let app = spawn_app().await;

    let response = app
        .as_admin(app.client.post(app.url("/v1/questions")))
        .json(&json!({
            "title": "ab",
            "options": [{ "title": "Beach", "imageUrl": "beach" }]
        }))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], 400);
    assert_eq!(body["message"], "Validation Error");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["options[0].imageUrl", "title"]);
}

#[tokio::test]
async fn test_malformed_body_and_query_are_400() {
    let app = spawn_app().await;

    let response = app
        .as_admin(app.client.post(app.url("/v1/questions")))
        .json(&json!({ "description": "no title" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["errors"][0]["location"], "body");

    let response = app
        .as_user(app.get("/v1/questions?perPage=0"))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["errors"][0]["field"], "perPage");
    assert_eq!(body["errors"][0]["location"], "query");
}

#[tokio::test]
async fn test_id_checks_differ_between_read_and_write_routes() {
    let app = spawn_app().await;

    // PUT/PATCH validate the id shape first.
    let response = app
        .as_user(app.client.patch(app.url("/v1/questions/not-an-id")))
        .json(&json!({ "description": "x" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["errors"][0]["field"], "id");
    assert_eq!(body["errors"][0]["location"], "params");

    // GET reports a malformed id as a missing record.
    let response = app
        .as_admin(app.get("/v1/questions/not-an-id"))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["message"], "Question does not exist");
}

#[tokio::test]
async fn test_question_pagination_over_http() {
    let app = spawn_app().await;

    for title in ["First question", "Second question", "Third question"] {
        let response = app
            .as_admin(app.client.post(app.url("/v1/questions")))
            .json(&json!({ "title": title }))
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let page: Vec<QuestionView> = app
        .as_user(app.get("/v1/questions?page=2&perPage=2"))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .expect("list json");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "First question");

    let empty: Vec<QuestionView> = app
        .as_user(app.get("/v1/questions?page=5"))
        .send()
        .await
        .expect("req fail")
        .json()
        .await
        .expect("list json");
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let app = spawn_app().await;

    let response = app
        .as_user(app.get("/v1/nothing-here"))
        .send()
        .await
        .expect("req fail");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.expect("error body");
    assert_eq!(body["code"], 404);
}

// --- SPA Shell ---

fn write_index(dir: &Path) {
    std::fs::write(
        dir.join("index.html"),
        "<!doctype html><title>sarpe-shell</title>",
    )
    .expect("index.html written");
}

#[tokio::test]
async fn test_spa_client_routes_serve_index() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_index(dir.path());

    let app = spawn_app_with(AppConfig {
        env: Env::Production,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        static_dir: Some(dir.path().to_string_lossy().into_owned()),
        ..AppConfig::default()
    })
    .await;

    for path in ["/", "/register", "/login", "/profile"] {
        let response = app.get(path).send().await.expect("req fail");
        assert_eq!(response.status(), StatusCode::OK, "path {path}");
        assert!(response.text().await.expect("body").contains("sarpe-shell"));
    }

    // API paths never fall through to the shell.
    let response = app
        .as_user(app.get("/v1/nothing-here"))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/health").send().await.expect("req fail");
    assert_eq!(response.text().await.expect("body"), "ok");
}
