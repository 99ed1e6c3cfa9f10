use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::feedback::dtos::{CreateFeedbackDto, FeedbackDto};
use crate::features::feedback::services::FeedbackService;
use crate::shared::types::ApiResponse;

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("Invalid {} timestamp", field)))
}

/// Record feedback for a file
///
/// The path id names the file the feedback is about. Both timestamps are
/// required RFC 3339 strings and the end must be after the start.
#[utoipa::path(
    post,
    path = "/api/feedback/{id}",
    tag = "feedback",
    params(("id" = String, Path, description = "File id the feedback is about")),
    request_body = CreateFeedbackDto,
    responses(
        (status = 201, description = "Feedback created", body = ApiResponse<FeedbackDto>),
        (status = 400, description = "Missing fields, bad timestamps or end before start"),
        (status = 404, description = "File not found")
    )
)]
pub async fn create_feedback(
    State(service): State<Arc<FeedbackService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<CreateFeedbackDto>,
) -> Result<(StatusCode, Json<ApiResponse<FeedbackDto>>), AppError> {
    let file_id = Uuid::parse_str(&id)
        .map_err(|_| AppError::Validation("Invalid file id format".to_string()))?;

    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let message = dto.feedback_message.trim();
    if message.is_empty() {
        return Err(AppError::Validation(
            "feedbackMessage is required".to_string(),
        ));
    }

    let start = parse_timestamp(&dto.start_call_time, "startCallTime")?;
    let end = parse_timestamp(&dto.end_call_time, "endCallTime")?;

    if end <= start {
        return Err(AppError::BadRequest(
            "endCallTime must be after startCallTime".to_string(),
        ));
    }

    let response = service.create(file_id, start, end, message).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(response),
            Some("Feedback recorded".to_string()),
        )),
    ))
}
