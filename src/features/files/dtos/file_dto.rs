use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::shared::constants::{
    ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES, DEFAULT_ROWS_PAGE_SIZE, MAX_ROWS_PAGE_SIZE,
};

/// Upload file request DTO for OpenAPI documentation.
/// The actual handlers use axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The spreadsheet to upload (.xlsx, .xls or .csv)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// Summary returned after upload and update
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSummaryDto {
    pub id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub upload_date: DateTime<Utc>,
    /// Whether any tabular rows were parsed out of the upload
    pub has_spreadsheet_data: bool,
    pub total_rows: i64,
}

/// File entry in the paginated listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileListItemDto {
    pub id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub size_formatted: String,
    pub upload_date: DateTime<Utc>,
    pub has_spreadsheet_data: bool,
    pub total_rows: i64,
    /// Derived from the first row's keys
    pub headers: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListPaginationDto {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_files: i64,
    pub files_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileListDto {
    pub files: Vec<FileListItemDto>,
    pub pagination: ListPaginationDto,
}

/// Full detail for a single file
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDetailDto {
    pub id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub size_formatted: String,
    pub upload_date: DateTime<Utc>,
    /// Whether the stored file is still present on disk
    pub file_exists: bool,
    pub has_spreadsheet_data: bool,
    pub total_rows: i64,
    pub headers: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponseDto {
    pub deleted: bool,
}

// =============================================================================
// ROW PAGINATION
// =============================================================================

fn default_rows_page() -> i64 {
    1
}

fn default_rows_limit() -> i64 {
    DEFAULT_ROWS_PAGE_SIZE
}

/// Pagination query for spreadsheet rows (larger default than file listings)
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RowsQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_rows_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Rows per page (default: 50, max: 500)
    #[serde(default = "default_rows_limit")]
    #[param(minimum = 1, maximum = 500)]
    pub limit: i64,
}

impl RowsQuery {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_ROWS_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowsFileInfoDto {
    pub id: Uuid,
    pub original_name: String,
    pub stored_name: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfoDto {
    pub headers: Vec<String>,
    pub total_rows: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowsPaginationDto {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_rows: i64,
    pub rows_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    /// 1-based index of the first row on this page
    pub start_row: i64,
    /// 1-based index of the last row on this page
    pub end_row: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RowsPageDto {
    pub file_info: RowsFileInfoDto,
    pub sheet_info: SheetInfoDto,
    #[schema(value_type = Vec<Object>)]
    pub rows: Value,
    pub pagination: RowsPaginationDto,
}

// =============================================================================
// UPLOAD GATE
// =============================================================================

/// Upload filter: both the extension and the MIME type must be on the
/// allow-list.
pub fn is_upload_allowed(filename: &str, mime_type: &str) -> bool {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    ALLOWED_EXTENSIONS.contains(&ext.as_str()) && ALLOWED_MIME_TYPES.contains(&mime_type)
}

/// Human-readable size, e.g. "1.5 KB"
pub fn format_file_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes <= 0 {
        return "0 Bytes".to_string();
    }

    let exponent = (((bytes as f64).ln() / 1024_f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);

    // Two decimals with trailing zeros dropped
    let rendered = format!("{:.2}", value);
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", rendered, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_gate_requires_extension_and_mime() {
        assert!(is_upload_allowed(
            "report.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        ));
        assert!(is_upload_allowed("data.CSV", "text/csv"));
        assert!(is_upload_allowed("old.xls", "application/vnd.ms-excel"));

        // Right extension, wrong MIME
        assert!(!is_upload_allowed("report.xlsx", "application/pdf"));
        // Right MIME, wrong extension
        assert!(!is_upload_allowed("report.pdf", "text/csv"));
        // No extension at all
        assert!(!is_upload_allowed("report", "text/csv"));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }
}
