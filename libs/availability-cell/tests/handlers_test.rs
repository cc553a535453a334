// libs/availability-cell/tests/handlers_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{extract::State, Json};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::json;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{header, method, path};

use availability_cell::handlers::get_available_slots;
use availability_cell::models::AvailableSlotsRequest;
use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn create_test_config() -> Arc<AppConfig> {
    // Nothing listens here; validation must reject before any lookup.
    TestConfig::default().to_arc()
}

fn create_auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(token).unwrap())
}

fn request(org: serde_json::Value, professional: &str, start: &str, end: &str) -> AvailableSlotsRequest {
    AvailableSlotsRequest {
        organization_id: Some(org),
        professional_id: Some(json!(professional)),
        service_id: Some(json!(12)),
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
    }
}

async fn call(config: Arc<AppConfig>, body: AvailableSlotsRequest) -> Result<serde_json::Value, AppError> {
    get_available_slots(State(config), None, Ok(Json(body)))
        .await
        .map(|Json(value)| value)
}

#[tokio::test]
async fn test_missing_parameters_are_listed() {
    let body = AvailableSlotsRequest {
        organization_id: Some(json!(1)),
        professional_id: None,
        service_id: Some(json!("")),
        start_date: Some("2030-01-07".to_string()),
        end_date: None,
    };

    let result = call(create_test_config(), body).await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) => {
        assert!(msg.contains("professionalId"));
        assert!(msg.contains("serviceId"));
        assert!(msg.contains("endDate"));
        assert!(!msg.contains("startDate"));
    });
}

#[tokio::test]
async fn test_invalid_organization_id_is_rejected() {
    for org in [json!("abc"), json!(0), json!(-3), json!(null), json!("1.5")] {
        let result = call(create_test_config(), request(org.clone(), "p-1", "2030-01-07", "2030-01-07")).await;
        assert_matches!(result, Err(AppError::BadRequest(msg)) => {
            assert!(msg.contains("organization"), "unexpected message for {}: {}", org, msg);
        });
    }
}

#[tokio::test]
async fn test_start_after_end_is_rejected() {
    let result = call(create_test_config(), request(json!(1), "p-1", "2030-01-08", "2030-01-07")).await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) => assert!(msg.contains("Start date")));
}

#[tokio::test]
async fn test_thirty_one_day_range_is_rejected() {
    let result = call(create_test_config(), request(json!(1), "any", "2030-01-07", "2030-02-07")).await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) => assert!(msg.contains("30 days")));
}

#[tokio::test]
async fn test_unparseable_date_is_rejected() {
    let result = call(create_test_config(), request(json!(1), "p-1", "07/01/2030", "2030-01-07")).await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) => assert!(msg.contains("07/01/2030")));
}

#[tokio::test]
async fn test_unknown_organization_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let result = call(config, request(json!("99"), "p-1", "2030-01-07", "2030-01-07")).await;

    assert_matches!(result, Err(AppError::NotFound(msg)) => assert_eq!(msg, "Organization not found"));
}

#[tokio::test]
async fn test_unknown_service_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockSupabaseResponses::organization(1)])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let result = call(config, request(json!(1), "p-1", "2030-01-07", "2030-01-07")).await;

    assert_matches!(result, Err(AppError::NotFound(msg)) => assert_eq!(msg, "Service not found"));
}

#[tokio::test]
async fn test_invalid_service_duration_is_internal_error() {
    for duration in [json!("abc"), json!(0), json!(-15), json!(30.5), json!(null), json!(1441), json!(u32::MAX)] {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/organizations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockSupabaseResponses::organization(1)])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                MockSupabaseResponses::service("12", 1, duration.clone())
            ])))
            .mount(&mock_server)
            .await;

        let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
        let result = call(config, request(json!(1), "p-1", "2030-01-07", "2030-01-07")).await;

        assert_matches!(result, Err(AppError::Internal(msg)) => {
            assert!(msg.contains("Invalid service duration"), "unexpected message for {}: {}", duration, msg);
        });
    }
}

#[tokio::test]
async fn test_bearer_token_is_forwarded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .and(header("Authorization", "Bearer user-session-token"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockSupabaseResponses::organization(1)])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::service("12", 1, json!(30))
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/work_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let result = get_available_slots(
        State(config),
        Some(create_auth_header("user-session-token")),
        Ok(Json(request(json!(1), "p-1", "2030-01-07", "2030-01-07"))),
    )
    .await;

    assert!(result.is_ok(), "Expected success, got {:?}", result.err());
    assert_eq!(result.unwrap().0["slotsByDate"]["2030-01-07"], json!([]));
}

#[tokio::test]
async fn test_vacation_lookup_failure_keeps_day_open() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/organizations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockSupabaseResponses::organization(1)])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::service("12", 1, json!(60))
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/work_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::weekly_schedule("p-1", 1, "09:00", "10:00")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/vacation_requests"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;
    for table in ["schedule_breaks", "appointments", "group_activities"] {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", table)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;
    }

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let response = call(config, request(json!(1), "p-1", "2030-01-07", "2030-01-07")).await.unwrap();

    let slots = response["slotsByDate"]["2030-01-07"].as_array().unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["start_time"], "09:00");
    assert_eq!(slots[0]["end_time"], "10:00");
}
