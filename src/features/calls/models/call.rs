use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for call sessions.
///
/// `end_call_time` is set at most once; `duration` (whole seconds) is
/// written in the same statement. A call with `end_call_time` still null
/// is in progress. `file_id` is a weak reference: the file may have been
/// soft-deleted since the call started.
#[derive(Debug, FromRow)]
pub struct Call {
    pub id: Uuid,
    pub file_id: Option<Uuid>,
    pub start_call_time: DateTime<Utc>,
    pub end_call_time: Option<DateTime<Utc>>,
    pub duration: i64,
    pub feedback_message: String,
    pub created_at: DateTime<Utc>,
}
