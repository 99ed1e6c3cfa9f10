use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackDto {
    /// RFC 3339 timestamp of the call start
    #[validate(length(min = 1, message = "startCallTime is required"))]
    pub start_call_time: String,

    /// RFC 3339 timestamp of the call end, after the start
    #[validate(length(min = 1, message = "endCallTime is required"))]
    pub end_call_time: String,

    #[validate(length(min = 1, message = "feedbackMessage is required"))]
    pub feedback_message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDto {
    pub id: Uuid,
    pub file_id: Uuid,
    /// Display name of the file the feedback is about
    pub file_name: String,
    pub start_call_time: DateTime<Utc>,
    pub end_call_time: DateTime<Utc>,
    /// Whole seconds between start and end
    pub duration: i64,
    /// Duration rendered as "Xm Ys"
    pub formatted_duration: String,
    pub feedback_message: String,
    pub created_at: DateTime<Utc>,
}

/// Render whole seconds as "Xm Ys"
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}m {}s", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0m 0s");
        assert_eq!(format_duration(59), "0m 59s");
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(-5), "0m 0s");
    }
}
