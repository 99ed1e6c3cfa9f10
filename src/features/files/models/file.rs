use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for uploaded files.
///
/// `rows` is the JSONB array of parsed spreadsheet rows (header -> value
/// maps); it is empty for uploads that carried no tabular data. Records are
/// only ever soft-deleted, so a plain unfiltered select doubles as the
/// administrative bypass for recovering deleted files.
#[derive(Debug, FromRow)]
pub struct File {
    pub id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub rows: Value,
    pub upload_date: DateTime<Utc>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl File {
    pub fn row_count(&self) -> i64 {
        self.rows.as_array().map(|a| a.len() as i64).unwrap_or(0)
    }

    /// Column headers, derived from the first row's keys (never stored).
    pub fn headers(&self) -> Vec<String> {
        self.rows
            .as_array()
            .and_then(|a| a.first())
            .and_then(|first| first.as_object())
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default()
    }
}
