use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::{
    format_file_size, FileDetailDto, FileListDto, FileListItemDto, FileSummaryDto,
    ListPaginationDto, RowsFileInfoDto, RowsPageDto, RowsPaginationDto, RowsQuery, SheetInfoDto,
};
use crate::features::files::models::File;
use crate::modules::ingest::{self, ParseFailurePolicy};
use crate::modules::storage::DiskStorage;
use crate::shared::types::PaginationQuery;

/// Service for uploaded-file operations
pub struct FileService {
    pool: PgPool,
    storage: Arc<DiskStorage>,
}

impl FileService {
    pub fn new(pool: PgPool, storage: Arc<DiskStorage>) -> Self {
        Self { pool, storage }
    }

    /// Parse rows out of a stored upload if it looks like a spreadsheet.
    ///
    /// With `Tolerate`, a parse failure degrades to zero rows (the upload
    /// path keeps the file). With `Reject` the failure propagates as a 400
    /// and the caller is responsible for removing the just-stored file.
    async fn ingest_rows(
        &self,
        path: &str,
        mime_type: &str,
        original_name: &str,
        policy: ParseFailurePolicy,
    ) -> Result<Vec<Value>> {
        if !ingest::is_spreadsheet(mime_type, original_name) {
            return Ok(Vec::new());
        }

        let path = PathBuf::from(path);
        let mime = mime_type.to_string();
        let name = original_name.to_string();

        // calamine/csv do blocking file I/O
        let parsed = tokio::task::spawn_blocking(move || {
            ingest::parse_spreadsheet(&path, &mime, &name)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Spreadsheet parse task failed: {}", e)))?;

        match parsed {
            Ok(rows) => Ok(rows.into_iter().map(Value::Object).collect()),
            Err(e) => match policy {
                ParseFailurePolicy::Tolerate => {
                    warn!(
                        "Spreadsheet parsing failed for '{}', storing zero rows: {}",
                        original_name, e
                    );
                    Ok(Vec::new())
                }
                ParseFailurePolicy::Reject => Err(AppError::BadRequest(
                    "Failed to parse spreadsheet file".to_string(),
                )),
            },
        }
    }

    /// Store an upload on disk, parse its rows and create the file record
    pub async fn upload(
        &self,
        data: Vec<u8>,
        original_name: &str,
        mime_type: &str,
    ) -> Result<FileSummaryDto> {
        let size_bytes = data.len() as i64;
        let stored = self.storage.save(original_name, &data).await?;

        let rows = self
            .ingest_rows(
                &stored.path,
                mime_type,
                original_name,
                ParseFailurePolicy::Tolerate,
            )
            .await?;

        let file = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (original_name, stored_name, mime_type, size_bytes, storage_path, rows)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(original_name)
        .bind(&stored.stored_name)
        .bind(mime_type)
        .bind(size_bytes)
        .bind(&stored.path)
        .bind(Value::Array(rows))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert file record: {:?}", e);
            AppError::Database(e)
        })?;

        info!(
            "File uploaded: id={}, name={}, size={}, rows={}",
            file.id,
            file.original_name,
            file.size_bytes,
            file.row_count()
        );

        Ok(Self::to_summary(file))
    }

    /// List non-deleted files, newest first, with pagination metadata
    pub async fn list(&self, query: &PaginationQuery) -> Result<FileListDto> {
        let page = query.page();
        let limit = query.limit();

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE is_deleted = FALSE")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count files: {:?}", e);
                    AppError::Database(e)
                })?;

        let files = sqlx::query_as::<_, File>(
            r#"
            SELECT * FROM files
            WHERE is_deleted = FALSE
            ORDER BY upload_date DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(query.offset())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list files: {:?}", e);
            AppError::Database(e)
        })?;

        let total_pages = total_pages(total, limit);

        Ok(FileListDto {
            files: files.into_iter().map(Self::to_list_item).collect(),
            pagination: ListPaginationDto {
                current_page: page,
                total_pages,
                total_files: total,
                files_per_page: limit,
                has_next_page: page < total_pages,
                has_prev_page: page > 1,
            },
        })
    }

    /// Fetch a record by id, including soft-deleted ones.
    /// This unfiltered lookup is the administrative bypass.
    async fn find_any(&self, id: Uuid) -> Result<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch file {}: {:?}", id, e);
                AppError::Database(e)
            })
    }

    /// Fetch a non-deleted record or fail with NotFound
    async fn find_active(&self, id: Uuid) -> Result<File> {
        match self.find_any(id).await? {
            Some(file) if !file.is_deleted => Ok(file),
            _ => Err(AppError::NotFound("File not found".to_string())),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<FileDetailDto> {
        let file = self.find_active(id).await?;
        let file_exists = self.storage.exists(&file.storage_path).await;

        Ok(FileDetailDto {
            id: file.id,
            size_formatted: format_file_size(file.size_bytes),
            file_exists,
            has_spreadsheet_data: file.row_count() > 0,
            total_rows: file.row_count(),
            headers: file.headers(),
            original_name: file.original_name,
            stored_name: file.stored_name,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            upload_date: file.upload_date,
            rows: file.rows,
        })
    }

    /// Resolve a non-deleted record whose stored file is present on disk
    pub async fn download(&self, id: Uuid) -> Result<File> {
        let file = self.find_active(id).await?;

        if !self.storage.exists(&file.storage_path).await {
            return Err(AppError::NotFound("File not found on disk".to_string()));
        }

        Ok(file)
    }

    /// Replace a file's content, metadata and rows wholesale.
    ///
    /// The prior on-disk file is removed only after the replacement parses;
    /// a parse failure removes the just-stored replacement instead and
    /// leaves the record untouched.
    pub async fn update(
        &self,
        id: Uuid,
        data: Vec<u8>,
        original_name: &str,
        mime_type: &str,
    ) -> Result<FileSummaryDto> {
        let existing = self.find_active(id).await?;

        let size_bytes = data.len() as i64;
        let stored = self.storage.save(original_name, &data).await?;

        let rows = match self
            .ingest_rows(
                &stored.path,
                mime_type,
                original_name,
                ParseFailurePolicy::Reject,
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                self.storage.delete(&stored.path).await?;
                return Err(e);
            }
        };

        self.storage.delete(&existing.storage_path).await?;

        let file = sqlx::query_as::<_, File>(
            r#"
            UPDATE files
            SET original_name = $2,
                stored_name = $3,
                mime_type = $4,
                size_bytes = $5,
                storage_path = $6,
                rows = $7,
                upload_date = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(original_name)
        .bind(&stored.stored_name)
        .bind(mime_type)
        .bind(size_bytes)
        .bind(&stored.path)
        .bind(Value::Array(rows))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update file record {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        info!(
            "File updated: id={}, name={}, rows={}",
            file.id,
            file.original_name,
            file.row_count()
        );

        Ok(Self::to_summary(file))
    }

    /// Mark a record deleted, keeping the row and the on-disk file for audit
    pub async fn soft_delete(&self, id: Uuid, deleted_by: Option<&str>) -> Result<()> {
        let deleted: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE files
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(deleted_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to soft-delete file {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        match deleted {
            Some(_) => {
                info!("File soft-deleted: id={}, by={:?}", id, deleted_by);
                Ok(())
            }
            None => Err(AppError::NotFound("File not found".to_string())),
        }
    }

    /// Page through a file's parsed rows
    pub async fn get_rows(&self, id: Uuid, query: &RowsQuery) -> Result<RowsPageDto> {
        let file = self.find_active(id).await?;

        let all_rows = file.rows.as_array().cloned().unwrap_or_default();
        if all_rows.is_empty() {
            return Err(AppError::BadRequest(
                "No spreadsheet data found for this file".to_string(),
            ));
        }

        let headers = file.headers();
        let (page_rows, pagination) = slice_rows(&all_rows, query.page(), query.limit());

        Ok(RowsPageDto {
            file_info: RowsFileInfoDto {
                id: file.id,
                original_name: file.original_name,
                stored_name: file.stored_name,
                upload_date: file.upload_date,
            },
            sheet_info: SheetInfoDto {
                headers,
                total_rows: all_rows.len() as i64,
            },
            rows: Value::Array(page_rows),
            pagination,
        })
    }

    fn to_summary(file: File) -> FileSummaryDto {
        FileSummaryDto {
            id: file.id,
            has_spreadsheet_data: file.row_count() > 0,
            total_rows: file.row_count(),
            original_name: file.original_name,
            stored_name: file.stored_name,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            upload_date: file.upload_date,
        }
    }

    fn to_list_item(file: File) -> FileListItemDto {
        FileListItemDto {
            id: file.id,
            size_formatted: format_file_size(file.size_bytes),
            has_spreadsheet_data: file.row_count() > 0,
            total_rows: file.row_count(),
            headers: file.headers(),
            original_name: file.original_name,
            stored_name: file.stored_name,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            upload_date: file.upload_date,
            rows: file.rows,
        }
    }
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit.max(1)
}

/// Take one page out of a row array and describe it
fn slice_rows(rows: &[Value], page: i64, limit: i64) -> (Vec<Value>, RowsPaginationDto) {
    let total_rows = rows.len() as i64;
    let total_pages = total_pages(total_rows, limit);
    let skip = (page - 1) * limit;

    let page_rows: Vec<Value> = rows
        .iter()
        .skip(skip.max(0) as usize)
        .take(limit as usize)
        .cloned()
        .collect();

    let pagination = RowsPaginationDto {
        current_page: page,
        total_pages,
        total_rows,
        rows_per_page: limit,
        has_next_page: page < total_pages,
        has_prev_page: page > 1,
        start_row: (skip + 1).min(total_rows + 1),
        end_row: (skip + limit).min(total_rows),
    };

    (page_rows, pagination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rows(n: usize) -> Vec<Value> {
        (1..=n).map(|i| json!({ "Index": i })).collect()
    }

    #[test]
    fn test_slice_rows_middle_page() {
        let rows = sample_rows(25);
        let (page, meta) = slice_rows(&rows, 2, 10);

        assert_eq!(page.len(), 10);
        assert_eq!(page.first().unwrap()["Index"], 11);
        assert_eq!(page.last().unwrap()["Index"], 20);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);
        assert_eq!(meta.start_row, 11);
        assert_eq!(meta.end_row, 20);
    }

    #[test]
    fn test_slice_rows_last_partial_page() {
        let rows = sample_rows(25);
        let (page, meta) = slice_rows(&rows, 3, 10);

        assert_eq!(page.len(), 5);
        assert_eq!(page.last().unwrap()["Index"], 25);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
        assert_eq!(meta.end_row, 25);
    }

    #[test]
    fn test_slice_rows_past_the_end() {
        let rows = sample_rows(5);
        let (page, meta) = slice_rows(&rows, 4, 10);

        assert!(page.is_empty());
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }
}
