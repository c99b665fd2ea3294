use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use auth_cell::router::auth_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils};

fn create_test_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get_session(token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri("/session")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn mount_user_record(server: &MockServer, user: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user.record()])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_validate_token_endpoint() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config.clone());

    let user = TestUser::patient("test@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = json_body(response).await;
    assert_eq!(json_response["valid"], true);
    assert_eq!(json_response["user_id"], user.id);
    assert_eq!(json_response["email"], user.email);
    assert_eq!(json_response["role"], "authenticated");
}

#[tokio::test]
async fn test_validate_token_endpoint_unauthorized() {
    let app = create_test_app(TestConfig::default().to_app_config());

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json_response = json_body(response).await;
    assert_eq!(json_response["error"], "Missing authorization header");
}

#[tokio::test]
async fn test_validate_rejects_expired_token() {
    let config = TestConfig::default().to_app_config();
    let user = TestUser::default();
    let token = JwtTestUtils::create_expired_token(&user, &config.supabase_jwt_secret);

    let request = Request::builder()
        .method("POST")
        .uri("/validate")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Token expired");
}

#[tokio::test]
async fn test_verify_token_endpoint() {
    let config = TestConfig::default().to_app_config();
    let user = TestUser::default();

    let valid = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(1));
    let forged = JwtTestUtils::create_invalid_signature_token(&user);

    for (token, expected) in [(valid, true), (forged, false), (JwtTestUtils::create_malformed_token(), false)] {
        let request = Request::builder()
            .method("POST")
            .uri("/verify")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = create_test_app(config.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["valid"], expected);
    }
}

#[tokio::test]
async fn test_session_grants_console_to_pure_system_admin() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let admin = TestUser::system_admin("admin@example.com");
    mount_user_record(&mock_server, &admin).await;

    let response = create_test_app(config).oneshot(get_session(&admin.token())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session = json_body(response).await;
    assert_eq!(session["user_id"], admin.id);
    assert_eq!(session["is_system_admin"], true);
    assert_eq!(session["console_access"], "system_admin");
}

#[tokio::test]
async fn test_session_refuses_console_to_other_roles() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();

    let hospital_admin = TestUser::hospital_admin("hadmin@example.com");
    let patient = TestUser::patient("patient@example.com");
    mount_user_record(&mock_server, &hospital_admin).await;
    mount_user_record(&mock_server, &patient).await;

    let response = create_test_app(config.clone()).oneshot(get_session(&hospital_admin.token())).await.unwrap();
    assert_eq!(json_body(response).await["console_access"], "hospital_admin_unsupported");

    let response = create_test_app(config).oneshot(get_session(&patient.token())).await.unwrap();
    assert_eq!(json_body(response).await["console_access"], "not_an_admin");
}

#[tokio::test]
async fn test_session_without_user_record_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(mock_server.uri()).to_app_config();
    let user = TestUser::default();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = create_test_app(config).oneshot(get_session(&user.token())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_requires_token() {
    let app = create_test_app(TestConfig::default().to_app_config());

    let request = Request::builder()
        .method("GET")
        .uri("/session")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsupported_methods_and_routes() {
    let config = TestConfig::default().to_app_config();

    let request = Request::builder()
        .method("GET")
        .uri("/validate")
        .body(Body::empty())
        .unwrap();
    let response = create_test_app(config.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let request = Request::builder()
        .method("GET")
        .uri("/nonexistent")
        .body(Body::empty())
        .unwrap();
    let response = create_test_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
