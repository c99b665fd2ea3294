use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::router::doctor_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser, TEST_JWT_SECRET};

fn app(server: &MockServer) -> Router {
    doctor_routes(TestConfig::with_url(server.uri()).to_arc())
}

async fn send(app: Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn doctor_body(name: &str) -> Value {
    let mut record = MockSupabaseResponses::doctor_record("ignored", name, "hosp-1");
    if let Some(map) = record.as_object_mut() {
        map.remove("id");
    }
    record
}

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    let (status, _) = send(app(&server), "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = JwtTestUtils::create_expired_token(&user, TEST_JWT_SECRET);
    let (status, _) = send(app(&server), "GET", "/", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = JwtTestUtils::create_invalid_signature_token(&user);
    let (status, _) = send(app(&server), "GET", "/", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_filters_by_hospital_and_sorts_case_insensitively() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("hospital_id", "eq.hosp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d2", "Zed", "hosp-1"),
            MockSupabaseResponses::doctor_record("d1", "adams", "hosp-1"),
            MockSupabaseResponses::doctor_record("d3", "Brown", "hosp-1"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "GET", "/?hospital_id=hosp-1", Some(&user.token()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let names: Vec<&str> = body["doctors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["adams", "Brown", "Zed"]);
}

#[tokio::test]
async fn get_missing_doctor_is_not_found() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.nope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "GET", "/nope", Some(&user.token()), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Doctor not found");
}

#[tokio::test]
async fn create_writes_office_hours_with_named_days() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({
            "name": "Dr. House",
            "office_hours": {
                "monday": { "available": true, "start_time": "09:00", "end_time": "17:00" },
                "sunday": { "available": false }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::doctor_record("new-id", "Dr. House", "hosp-1")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "POST", "/", Some(&user.token()), Some(doctor_body("Dr. House"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "new-id");
    assert_eq!(body["office_hours"]["friday"]["end_time"], "17:00");
}

#[tokio::test]
async fn create_rejects_inverted_office_hours_without_writing() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut body = doctor_body("Dr. Late");
    body["office_hours"]["tuesday"] = MockSupabaseResponses::open_day("18:00", "08:00");

    let (status, response) = send(app(&server), "POST", "/", Some(&user.token()), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].as_str().unwrap().contains("tuesday"));
}

#[tokio::test]
async fn update_of_unknown_doctor_is_not_found() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, _) = send(app(&server), "PUT", "/ghost", Some(&user.token()), Some(doctor_body("Dr. Ghost"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.d1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "DELETE", "/d1", Some(&user.token()), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn photo_upload_stores_under_doctor_folder_and_records_url() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d1", "Dr. One", "hosp-1")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/photos/doctor_photos/d1"))
        .and(header("Content-Type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "photos/doctor_photos/d1" })))
        .expect(1)
        .mount(&server)
        .await;

    let expected_url = format!("{}/storage/v1/object/public/photos/doctor_photos/d1", server.uri());
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(body_partial_json(json!({ "profile_picture_uri": expected_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d1", "Dr. One", "hosp-1")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let upload = json!({ "image_data": "iVBORw0KGgo=", "content_type": "image/png" });
    let (status, body) = send(app(&server), "PUT", "/d1/photo", Some(&user.token()), Some(upload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile_picture_uri"], expected_url);
}

#[tokio::test]
async fn photo_upload_rejects_unsupported_types() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d1", "Dr. One", "hosp-1")
        ])))
        .mount(&server)
        .await;

    let upload = json!({ "image_data": "AAAA", "content_type": "image/webp" });
    let (status, body) = send(app(&server), "PUT", "/d1/photo", Some(&user.token()), Some(upload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("JPEG"));
}

#[tokio::test]
async fn photo_upload_reports_storage_outage_as_bad_gateway() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d1", "Dr. One", "hosp-1")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/photos/doctor_photos/d1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "bucket offline" })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let upload = json!({ "image_data": "iVBORw0KGgo=", "content_type": "image/png" });
    let (status, body) = send(app(&server), "PUT", "/d1/photo", Some(&user.token()), Some(upload)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("bucket offline"));
}
