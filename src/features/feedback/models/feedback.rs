use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for feedback entries. Immutable once created.
#[derive(Debug, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub file_id: Uuid,
    pub start_call_time: DateTime<Utc>,
    pub end_call_time: DateTime<Utc>,
    pub duration: i64,
    pub feedback_message: String,
    pub created_at: DateTime<Utc>,
}
