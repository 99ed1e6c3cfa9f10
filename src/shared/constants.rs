/// Default page size for file listings
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed for file listings
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default page size for spreadsheet row pagination
pub const DEFAULT_ROWS_PAGE_SIZE: i64 = 50;

/// Maximum page size allowed for spreadsheet row pagination
pub const MAX_ROWS_PAGE_SIZE: i64 = 500;

// =============================================================================
// UPLOAD CONSTRAINTS
// =============================================================================

/// Maximum upload size in bytes (90 MiB)
pub const MAX_UPLOAD_SIZE: usize = 90 * 1024 * 1024;

/// File extensions accepted by the upload filter (lowercase, with dot)
pub const ALLOWED_EXTENSIONS: &[&str] = &[".xlsx", ".xls", ".csv"];

/// MIME types accepted by the upload filter
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/csv",
    "application/csv",
    "application/vnd.ms-excel.sheet.macroEnabled.12",
    "application/vnd.ms-excel.sheet.binary.macroEnabled.12",
];
