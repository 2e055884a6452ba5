// =====================================================================================
// CONSULTATION CELL INTEGRATION TESTS
// Full router with the real authentication middleware, exercised via
// tower::ServiceExt against a wiremock-backed document store.
// =====================================================================================

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use consultation_cell::router::consultation_routes;
use consultation_cell::services::lifecycle::ConsultationLifecycleService;
use shared_config::AppConfig;
use shared_database::HttpDocumentStore;
use shared_utils::test_utils::{JwtTestUtils, MockStoreDocs, TestConfig, TestUser};

fn create_test_app(server: &MockServer) -> (Router, AppConfig) {
    let config = TestConfig::with_store_url(&server.uri()).to_app_config();
    let store = Arc::new(HttpDocumentStore::new(&config));
    let lifecycle = Arc::new(ConsultationLifecycleService::new(store));
    let app = consultation_routes(Arc::new(config.clone()), lifecycle);
    (app, config)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn join_without_a_token_is_unauthorized() {
    let server = MockServer::start().await;
    let (app, _config) = create_test_app(&server);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/join/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn join_with_a_malformed_token_is_unauthorized() {
    let server = MockServer::start().await;
    let (app, _config) = create_test_app(&server);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/join/{}", Uuid::new_v4()))
        .header(
            "authorization",
            format!("Bearer {}", JwtTestUtils::create_malformed_token()),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_join_creates_a_session_end_to_end() {
    let server = MockServer::start().await;
    let (app, config) = create_test_app(&server);

    let appointment_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreDocs::appointment(
                &appointment_id.to_string(),
                &patient_id.to_string(),
                &doctor.id,
                Utc::now(),
                "confirmed",
                false,
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": appointment_id }])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/consultations"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": "created" }])))
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&doctor, &config.auth_jwt_secret, Some(24));
    let request = Request::builder()
        .method("GET")
        .uri(format!("/join/{}", appointment_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["video_call_id"], format!("call_{}", appointment_id));
    assert_eq!(body["user_role"], "doctor");
    assert_eq!(body["patient_id"], patient_id.to_string());
    assert_eq!(body["doctor_id"], doctor.id);
}

#[tokio::test]
async fn rejoining_a_completed_consultation_is_rejected() {
    let server = MockServer::start().await;
    let (app, config) = create_test_app(&server);

    let consultation_id = Uuid::new_v4();
    let patient = TestUser::patient("pat@example.com");

    let mut doc = MockStoreDocs::consultation(
        &consultation_id.to_string(),
        &Uuid::new_v4().to_string(),
        &patient.id,
        &Uuid::new_v4().to_string(),
        "completed",
    );
    doc["end_time"] = json!(Utc::now());

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", consultation_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doc])))
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, &config.auth_jwt_secret, Some(24));
    let request = Request::builder()
        .method("GET")
        .uri(format!("/join/{}", consultation_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Consultation not active");
    assert_eq!(body["consultation_data"]["status"], "completed");
    assert!(!body["consultation_data"]["end_time"].is_null());
}

#[tokio::test]
async fn doctor_completes_a_consultation_end_to_end() {
    let server = MockServer::start().await;
    let (app, config) = create_test_app(&server);

    let consultation_id = Uuid::new_v4();
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", consultation_id)))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": consultation_id }])))
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&doctor, &config.auth_jwt_secret, Some(24));
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}/complete", consultation_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Consultation marked as completed");
}

#[tokio::test]
async fn patient_updates_notes_end_to_end() {
    let server = MockServer::start().await;
    let (app, config) = create_test_app(&server);

    let consultation_id = Uuid::new_v4();
    let patient = TestUser::patient("pat@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", consultation_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreDocs::consultation(
                &consultation_id.to_string(),
                &Uuid::new_v4().to_string(),
                &patient.id,
                &Uuid::new_v4().to_string(),
                "active",
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/consultations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": consultation_id }])))
        .mount(&server)
        .await;

    let token = JwtTestUtils::create_test_token(&patient, &config.auth_jwt_secret, Some(24));
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/{}/notes", consultation_id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "notes": "felt much better today" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Notes updated successfully");
}
