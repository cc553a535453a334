use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AvailabilityError, AvailableSlotsRequest};
use crate::services::availability::AvailabilityService;

fn map_availability_error(err: AvailabilityError) -> AppError {
    match err {
        AvailabilityError::MissingParameter(_)
        | AvailabilityError::InvalidOrganizationId
        | AvailabilityError::InvalidDate(_)
        | AvailabilityError::InvalidDateRange
        | AvailabilityError::RangeTooLarge { .. } => AppError::BadRequest(err.to_string()),
        AvailabilityError::OrganizationNotFound | AvailabilityError::ServiceNotFound => {
            AppError::NotFound(err.to_string())
        }
        AvailabilityError::InvalidServiceDuration(_) => AppError::Internal(err.to_string()),
        AvailabilityError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    payload: Result<Json<AvailableSlotsRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;
    let token = auth.as_ref().map(|TypedHeader(auth)| auth.token());

    let availability_service = AvailabilityService::new(&state);

    let response = availability_service.get_available_slots(request, token).await
        .map_err(map_availability_error)?;

    Ok(Json(json!(response)))
}
