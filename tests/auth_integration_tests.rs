use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, request::Parts},
};
use chrono::TimeDelta;
use jsonwebtoken::{DecodingKey, Validation, decode};
use sarpe_api::{
    AppState, InMemoryStore,
    auth::{AdminUser, AuthUser, Claims, DEV_ROLE_HEADER, Role, issue_token},
    config::{AppConfig, Env},
    models::{Location, Question},
};
use std::sync::Arc;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: &str = "5f7c1a2b3c4d5e6f7a8b9c0d";

fn token(role: Role, ttl: TimeDelta) -> String {
    issue_token(TEST_JWT_SECRET, TEST_USER_ID, role, ttl).expect("token is signed")
}

fn create_app_state(env: Env) -> AppState {
    create_app_state_with_bypass(env, false)
}

fn create_app_state_with_bypass(env: Env, auth_dev_bypass: bool) -> AppState {
    let config = AppConfig {
        env,
        auth_dev_bypass,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        questions: Arc::new(InMemoryStore::<Question>::new()),
        locations: Arc::new(InMemoryStore::<Location>::new()),
        config,
    }
}

/// Parts of a GET request carrying the given headers.
fn request_parts(headers: &[(&str, String)]) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/v1/questions");
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    let (parts, _) = builder
        .body(axum::body::Body::empty())
        .expect("request builds")
        .into_parts();
    parts
}

fn bearer(token: &str) -> (&'static str, String) {
    ("authorization", format!("Bearer {token}"))
}

// --- Token Issuing ---

#[test]
fn test_issued_token_carries_subject_and_role() {
    let token = token(Role::Admin, TimeDelta::hours(1));

    let decoded = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        &Validation::default(),
    )
    .expect("token decodes");

    assert_eq!(decoded.claims.sub, TEST_USER_ID);
    assert_eq!(decoded.claims.role, Role::Admin);
    assert!(decoded.claims.exp > decoded.claims.iat);
}

#[test]
fn test_role_ordering() {
    assert!(Role::Admin.grants(Role::User));
    assert!(Role::Admin.grants(Role::Admin));
    assert!(Role::User.grants(Role::User));
    assert!(!Role::User.grants(Role::Admin));
    assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
    assert!("root".parse::<Role>().is_err());
}

// --- AuthUser Extraction ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let app_state = create_app_state(Env::Production);
    let mut parts = request_parts(&[bearer(&token(Role::User, TimeDelta::hours(1)))]);

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect("valid token authenticates");

    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, Role::User);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(Env::Production);
    let mut parts = request_parts(&[]);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect_err("no credentials");

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_scheme_or_garbage_token() {
    let app_state = create_app_state(Env::Production);

    let token = token(Role::User, TimeDelta::hours(1));
    for value in [format!("Token {token}"), "Bearer not.a.jwt".to_string()] {
        let mut parts = request_parts(&[("authorization", value)]);
        let err = AuthUser::from_request_parts(&mut parts, &app_state)
            .await
            .expect_err("credentials are rejected");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_auth_failure_with_foreign_signature() {
    let app_state = create_app_state(Env::Production);
    let foreign = issue_token("some-other-secret", TEST_USER_ID, Role::Admin, TimeDelta::hours(1))
        .expect("token is signed");
    let mut parts = request_parts(&[bearer(&foreign)]);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect_err("signature does not match");

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    let app_state = create_app_state(Env::Production);
    // Well past the default validation leeway.
    let mut parts = request_parts(&[bearer(&token(Role::Admin, TimeDelta::hours(-2)))]);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect_err("token has expired");

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_header_bypass_when_enabled() {
    let app_state = create_app_state_with_bypass(Env::Local, true);
    let mut parts = request_parts(&[(DEV_ROLE_HEADER, "admin".to_string())]);

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect("local bypass authenticates");

    assert_eq!(user.id, "local-admin");
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_role_header_is_ignored_without_opt_in() {
    let app_state = create_app_state(Env::Local);
    let mut parts = request_parts(&[(DEV_ROLE_HEADER, "admin".to_string())]);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect_err("local env alone does not enable the bypass");

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_header_is_ignored_in_production() {
    let app_state = create_app_state(Env::Production);
    let mut parts = request_parts(&[(DEV_ROLE_HEADER, "admin".to_string())]);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect_err("bypass is off");

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_identity_in_extensions_wins() {
    let app_state = create_app_state(Env::Production);
    let mut parts = request_parts(&[]);
    let attached = AuthUser {
        id: "already-resolved".to_string(),
        role: Role::User,
    };
    parts.extensions.insert(attached.clone());

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect("extension identity is reused");

    assert_eq!(user, attached);
}

// --- AdminUser Extraction ---

#[tokio::test]
async fn test_admin_extractor_accepts_admin() {
    let app_state = create_app_state(Env::Production);
    let mut parts = request_parts(&[bearer(&token(Role::Admin, TimeDelta::hours(1)))]);

    let AdminUser(user) = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect("admin passes");

    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_admin_extractor_forbids_plain_user() {
    let app_state = create_app_state(Env::Production);
    let mut parts = request_parts(&[bearer(&token(Role::User, TimeDelta::hours(1)))]);

    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect_err("users are not admins");

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_extractor_unauthenticated_is_401_not_403() {
    let app_state = create_app_state(Env::Production);
    let mut parts = request_parts(&[]);

    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .expect_err("no credentials");

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}
