use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn app(server: &MockServer) -> Router {
    appointment_routes(TestConfig::with_url(server.uri()).to_arc())
}

async fn send(app: Router, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token));
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

/// A Monday at least a week ahead, so it is never inside the upcoming buffer.
fn future_monday() -> NaiveDate {
    let mut day = Local::now().date_naive() + Duration::days(7);
    while day.weekday() != Weekday::Mon {
        day += Duration::days(1);
    }
    day
}

fn ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

async fn mount_doctor(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d1", "Dr. One", "hosp-1")
        ])))
        .mount(server)
        .await;
}

async fn mount_bookings(server: &MockServer, date: NaiveDate, bookings: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.d1"))
        .and(query_param("date", format!("eq.{}", ymd(date))))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(bookings)))
        .mount(server)
        .await;
}

fn booking_request(date: NaiveDate, time: &str) -> Value {
    json!({
        "user_id": "u1",
        "hospital_id": "hosp-1",
        "doctor_id": "d1",
        "date": ymd(date),
        "appointment_time": time,
        "reason_for_visit": "Checkup"
    })
}

#[tokio::test]
async fn availability_excludes_booked_slots() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let monday = future_monday();

    mount_doctor(&server).await;
    mount_bookings(&server, monday, vec![
        MockSupabaseResponses::appointment_record("a1", "u1", "d1", &ymd(monday), "09:30"),
        MockSupabaseResponses::appointment_record("a2", "u2", "d1", &ymd(monday), "07:00"),
    ]).await;

    let uri = format!("/availability?doctor_id=d1&date={}", ymd(monday));
    let (status, body) = send(app(&server), "GET", &uri, &user.token(), None).await;

    assert_eq!(status, StatusCode::OK);
    let times: Vec<&str> = body["available_times"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(times.len(), 15);
    assert_eq!(times.first(), Some(&"09:00 AM"));
    assert_eq!(times.last(), Some(&"04:30 PM"));
    assert!(!times.contains(&"09:30 AM"));
}

#[tokio::test]
async fn availability_keeps_the_edited_appointments_slot() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let monday = future_monday();
    let own = MockSupabaseResponses::appointment_record("a1", "u1", "d1", &ymd(monday), "09:30");

    mount_doctor(&server).await;
    mount_bookings(&server, monday, vec![own.clone()]).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([own])))
        .mount(&server)
        .await;

    let uri = format!("/availability?doctor_id=d1&date={}&editing_appointment_id=a1", ymd(monday));
    let (status, body) = send(app(&server), "GET", &uri, &user.token(), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_times"].as_array().unwrap().len(), 16);
    assert_eq!(body["available_times"][1], "09:30 AM");
}

#[tokio::test]
async fn availability_on_a_closed_day_is_empty() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let sunday = future_monday() - Duration::days(1);

    mount_doctor(&server).await;
    mount_bookings(&server, sunday, vec![]).await;

    let uri = format!("/availability?doctor_id=d1&date={}", ymd(sunday));
    let (status, body) = send(app(&server), "GET", &uri, &user.token(), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_times"], json!([]));
}

#[tokio::test]
async fn booking_stores_the_canonical_time_and_doctor_department() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let monday = future_monday();

    mount_doctor(&server).await;
    mount_bookings(&server, monday, vec![]).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({
            "appointment_start_time": "14:30",
            "department_id": "dept-1",
            "hospital_id": "hosp-1",
            "date": ymd(monday)
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_record("new", "u1", "d1", &ymd(monday), "14:30")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "POST", "/", &user.token(), Some(booking_request(monday, "02:30 PM"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "new");
    assert_eq!(body["appointment_start_time"], "14:30");
}

#[tokio::test]
async fn booking_a_taken_slot_conflicts() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let monday = future_monday();

    mount_doctor(&server).await;
    mount_bookings(&server, monday, vec![
        MockSupabaseResponses::appointment_record("a1", "u2", "d1", &ymd(monday), "09:30"),
    ]).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "POST", "/", &user.token(), Some(booking_request(monday, "09:30 AM"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Appointment slot not available");
}

#[tokio::test]
async fn booking_that_loses_a_race_for_the_slot_conflicts() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let monday = future_monday();

    mount_doctor(&server).await;
    mount_bookings(&server, monday, vec![]).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response("duplicate key value violates unique constraint", "23505"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "POST", "/", &user.token(), Some(booking_request(monday, "09:30 AM"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Appointment slot not available");
}

#[tokio::test]
async fn booking_outside_office_hours_conflicts() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let monday = future_monday();

    mount_doctor(&server).await;
    mount_bookings(&server, monday, vec![]).await;

    let (status, _) = send(app(&server), "POST", "/", &user.token(), Some(booking_request(monday, "08:00 PM"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn booking_in_the_past_is_rejected() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let last_week = Local::now().date_naive() - Duration::days(7);

    let (status, body) = send(app(&server), "POST", "/", &user.token(), Some(booking_request(last_week, "09:00 AM"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("in the past"));
}

#[tokio::test]
async fn booking_a_doctor_from_another_hospital_is_rejected() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let monday = future_monday();

    mount_doctor(&server).await;
    let mut request = booking_request(monday, "09:00 AM");
    request["hospital_id"] = json!("hosp-2");

    let (status, _) = send(app(&server), "POST", "/", &user.token(), Some(request)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn past_appointments_only_accept_note_changes() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");
    let past = MockSupabaseResponses::appointment_record("old", "u1", "d1", "2020-01-06", "09:00");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([past.clone()])))
        .mount(&server)
        .await;

    let moved = booking_request(NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(), "10:00 AM");
    let (status, body) = send(app(&server), "PUT", "/old", &user.token(), Some(moved)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Past appointments only accept note changes");

    let mut notes_only = booking_request(NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(), "09:00 AM");
    notes_only["appointment_notes"] = json!("Follow up in a month");

    let mut updated = past.clone();
    updated["appointment_notes"] = json!("Follow up in a month");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({ "appointment_notes": "Follow up in a month" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "PUT", "/old", &user.token(), Some(notes_only)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment_notes"], "Follow up in a month");
    assert_eq!(body["appointment_start_time"], "09:00");
}

#[tokio::test]
async fn notes_endpoint_patches_only_notes() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    let mut updated = MockSupabaseResponses::appointment_record("a1", "u1", "d1", "2020-01-06", "09:00");
    updated["appointment_notes"] = json!("Seen");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.a1"))
        .and(body_partial_json(json!({ "appointment_notes": "Seen" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "PATCH", "/a1/notes", &user.token(), Some(json!({ "appointment_notes": "Seen" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment_notes"], "Seen");
}

#[tokio::test]
async fn upcoming_listing_joins_and_sorts() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_record("late", "u1", "d1", "2099-03-02", "15:00"),
            MockSupabaseResponses::appointment_record("early", "u1", "d2", "2099-03-02", "09:00"),
            MockSupabaseResponses::appointment_record("orphan", "u1", "gone", "2099-03-01", "09:00"),
            MockSupabaseResponses::appointment_record("history", "u1", "d1", "2001-03-01", "09:00"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d1", "Zed", "hosp-1"),
            MockSupabaseResponses::doctor_record("d2", "abel", "hosp-1"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u1", "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" }
        ])))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "GET", "/upcoming", &user.token(), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["appointments"][0]["id"], "early");
    assert_eq!(body["appointments"][0]["doctor_name"], "abel");
    assert_eq!(body["appointments"][0]["display_time"], "09:00 AM");
    assert_eq!(body["appointments"][1]["id"], "late");
    assert_eq!(body["appointments"][1]["patient"]["last_name"], "Lovelace");
}

#[tokio::test]
async fn past_listing_forwards_filters() {
    let server = MockServer::start().await;
    let user = TestUser::system_admin("admin@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", "eq.d1"))
        .and(query_param("hospital_id", "eq.hosp-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_record("history", "u1", "d1", "2001-03-01", "09:00"),
            MockSupabaseResponses::appointment_record("future", "u1", "d1", "2099-03-01", "09:00"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_record("d1", "Zed", "hosp-1"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u1", "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" }
        ])))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), "GET", "/past?doctor_id=d1&hospital_id=hosp-1", &user.token(), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["id"], "history");
    assert_eq!(body["appointments"][0]["phase"], "past");
}
