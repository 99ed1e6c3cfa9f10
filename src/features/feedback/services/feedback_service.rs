use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::feedback::dtos::{format_duration, FeedbackDto};
use crate::features::feedback::models::Feedback;

/// Service for feedback entries tied to uploaded files
pub struct FeedbackService {
    pool: PgPool,
}

impl FeedbackService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a feedback entry for a non-deleted file.
    ///
    /// The caller has already validated the timestamps; the file check
    /// happens here so a feedback row can never point at a file the API
    /// no longer serves.
    pub async fn create(
        &self,
        file_id: Uuid,
        start_call_time: DateTime<Utc>,
        end_call_time: DateTime<Utc>,
        feedback_message: &str,
    ) -> Result<FeedbackDto> {
        let file_name: Option<String> = sqlx::query_scalar(
            "SELECT original_name FROM files WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to resolve file {} for feedback: {:?}", file_id, e);
            AppError::Database(e)
        })?;

        let file_name =
            file_name.ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let duration = (end_call_time - start_call_time).num_seconds();

        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (file_id, start_call_time, end_call_time, duration, feedback_message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(file_id)
        .bind(start_call_time)
        .bind(end_call_time)
        .bind(duration)
        .bind(feedback_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert feedback for {}: {:?}", file_id, e);
            AppError::Database(e)
        })?;

        info!(
            "Feedback created: id={}, file_id={}, duration={}s",
            feedback.id, file_id, feedback.duration
        );

        Ok(FeedbackDto {
            id: feedback.id,
            file_id: feedback.file_id,
            file_name,
            start_call_time: feedback.start_call_time,
            end_call_time: feedback.end_call_time,
            duration: feedback.duration,
            formatted_duration: format_duration(feedback.duration),
            feedback_message: feedback.feedback_message,
            created_at: feedback.created_at,
        })
    }
}
