use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::calls::dtos::{
    CallDto, CallEndedDto, CallStartedDto, EndCallDto, StartCallDto, WeeklyChartDto,
};
use crate::features::calls::services::CallService;
use crate::shared::types::ApiResponse;

/// Start a call session
///
/// Creates a call record with the start time set to now. The `fileId`
/// body field is optional.
#[utoipa::path(
    post,
    path = "/api/calls/start",
    tag = "calls",
    request_body = StartCallDto,
    responses(
        (status = 201, description = "Call started", body = ApiResponse<CallStartedDto>),
        (status = 400, description = "Malformed file id")
    )
)]
pub async fn start_call(
    State(service): State<Arc<CallService>>,
    AppJson(dto): AppJson<StartCallDto>,
) -> Result<(StatusCode, Json<ApiResponse<CallStartedDto>>), AppError> {
    let file_id = match dto.file_id.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| AppError::Validation("Invalid file id format".to_string()))?,
        ),
        None => None,
    };

    let response = service.start(file_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(response),
            Some("Call started".to_string()),
        )),
    ))
}

/// End a call session
///
/// Sets the end time and derived duration exactly once. Ending a call
/// that does not exist or has already ended fails the same way.
#[utoipa::path(
    post,
    path = "/api/calls/end",
    tag = "calls",
    request_body = EndCallDto,
    responses(
        (status = 200, description = "Call ended", body = ApiResponse<CallEndedDto>),
        (status = 400, description = "Malformed id, call not found or already ended")
    )
)]
pub async fn end_call(
    State(service): State<Arc<CallService>>,
    AppJson(dto): AppJson<EndCallDto>,
) -> Result<Json<ApiResponse<CallEndedDto>>, AppError> {
    let call_id = Uuid::parse_str(&dto.call_id)
        .map_err(|_| AppError::Validation("Invalid call id format".to_string()))?;
    let feedback = dto.feedback_message.unwrap_or_default();

    let response = service.end(call_id, &feedback).await?;

    Ok(Json(ApiResponse::success(
        Some(response),
        Some("Call ended".to_string()),
    )))
}

/// List all calls, newest first
#[utoipa::path(
    get,
    path = "/api/calls/getAll",
    tag = "calls",
    responses(
        (status = 200, description = "All call records", body = ApiResponse<Vec<CallDto>>)
    )
)]
pub async fn get_all_calls(
    State(service): State<Arc<CallService>>,
) -> Result<Json<ApiResponse<Vec<CallDto>>>, AppError> {
    let response = service.list().await?;

    Ok(Json(ApiResponse::success(Some(response), None)))
}

/// Weekly usage chart
///
/// Counts calls longer than a minute per day of the current calendar
/// week and compares the total against the prior week.
#[utoipa::path(
    get,
    path = "/api/calls/getChart",
    tag = "calls",
    responses(
        (status = 200, description = "Current week aggregation", body = ApiResponse<WeeklyChartDto>)
    )
)]
pub async fn get_chart(
    State(service): State<Arc<CallService>>,
) -> Result<Json<ApiResponse<WeeklyChartDto>>, AppError> {
    let response = service.weekly_chart().await?;

    Ok(Json(ApiResponse::success(Some(response), None)))
}
