use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::files::dtos::{
    is_upload_allowed, DeleteFileResponseDto, FileDetailDto, FileListDto, FileSummaryDto,
    RowsPageDto, RowsQuery, UploadFileDto,
};
use crate::features::files::services::FileService;
use crate::shared::constants::{ALLOWED_EXTENSIONS, MAX_UPLOAD_SIZE};
use crate::shared::types::{ApiResponse, PaginationQuery};

/// An upload read out of a multipart body
struct UploadPart {
    data: Vec<u8>,
    filename: String,
    content_type: String,
}

/// Pull the `file` field out of a multipart request and gate it on size
/// and type before anything touches disk.
async fn read_upload(multipart: &mut Multipart) -> Result<UploadPart, AppError> {
    let mut upload: Option<UploadPart> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                upload = Some(UploadPart {
                    data: data.to_vec(),
                    filename,
                    content_type,
                });
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    if upload.data.is_empty() {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    }

    if upload.data.len() > MAX_UPLOAD_SIZE {
        return Err(AppError::UploadRejected(format!(
            "File too large. Maximum size is {} MB",
            MAX_UPLOAD_SIZE / 1024 / 1024
        )));
    }

    if !is_upload_allowed(&upload.filename, &upload.content_type) {
        return Err(AppError::UploadRejected(format!(
            "Only spreadsheet files are allowed ({})",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(upload)
}

fn parse_file_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid file id format".to_string()))
}

/// Upload a spreadsheet
///
/// Accepts multipart/form-data with a single `file` field. Spreadsheet
/// rows are parsed and stored alongside the file; a file that cannot be
/// parsed is still kept, with zero rows.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Spreadsheet upload form (.xlsx, .xls or .csv)",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<FileSummaryDto>),
        (status = 400, description = "Missing, oversized or disallowed file"),
        (status = 413, description = "Request body too large")
    )
)]
pub async fn upload_file(
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileSummaryDto>>), AppError> {
    let upload = read_upload(&mut multipart).await?;

    let response = service
        .upload(upload.data, &upload.filename, &upload.content_type)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(response),
            Some("File uploaded successfully".to_string()),
        )),
    ))
}

/// List uploaded files
///
/// Returns non-deleted files, newest upload first.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Paginated file listing", body = ApiResponse<FileListDto>)
    )
)]
pub async fn list_files(
    State(service): State<Arc<FileService>>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<FileListDto>>, AppError> {
    let response = service.list(&query).await?;

    Ok(Json(ApiResponse::success(Some(response), None)))
}

/// Get a single file's details
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File details", body = ApiResponse<FileDetailDto>),
        (status = 400, description = "Malformed file id"),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file(
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileDetailDto>>, AppError> {
    let id = parse_file_id(&id)?;
    let response = service.get_by_id(id).await?;

    Ok(Json(ApiResponse::success(Some(response), None)))
}

/// Replace a file's content
///
/// Uploads a new spreadsheet in place of the existing one. Unlike upload,
/// a replacement that fails to parse is rejected and the record keeps its
/// previous content.
#[utoipa::path(
    put,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = String, Path, description = "File id")),
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Replacement spreadsheet",
    ),
    responses(
        (status = 200, description = "File updated successfully", body = ApiResponse<FileSummaryDto>),
        (status = 400, description = "Malformed id, disallowed file or unparseable spreadsheet"),
        (status = 404, description = "File not found")
    )
)]
pub async fn update_file(
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileSummaryDto>>, AppError> {
    let id = parse_file_id(&id)?;
    let upload = read_upload(&mut multipart).await?;

    let response = service
        .update(id, upload.data, &upload.filename, &upload.content_type)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(response),
        Some("File updated successfully".to_string()),
    )))
}

/// Soft-delete a file
///
/// The record and the on-disk file are kept; the file just stops
/// appearing in listings and lookups. The optional `x-user-id` header is
/// recorded as the deleting actor.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id"),
        ("x-user-id" = Option<String>, Header, description = "Actor recorded on the deletion")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 400, description = "Malformed file id"),
        (status = 404, description = "File not found or already deleted")
    )
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    let id = parse_file_id(&id)?;
    let deleted_by = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    service.soft_delete(id, deleted_by).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto { deleted: true }),
        Some("File deleted successfully".to_string()),
    )))
}

/// Download the stored file
///
/// Streams the original bytes back with an attachment disposition under
/// the original filename.
#[utoipa::path(
    get,
    path = "/api/files/download/{id}",
    tag = "files",
    params(("id" = String, Path, description = "File id")),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed file id"),
        (status = 404, description = "File not found, or missing on disk")
    )
)]
pub async fn download_file(
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_file_id(&id)?;
    let file = service.download(id).await?;

    let handle = tokio::fs::File::open(&file.storage_path)
        .await
        .map_err(|_| AppError::NotFound("File not found on disk".to_string()))?;
    let stream = ReaderStream::new(handle);

    // Strip quotes so the disposition header stays well-formed
    let safe_name = file.original_name.replace('"', "");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type)
        .header(header::CONTENT_LENGTH, file.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", safe_name),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

/// Page through a file's parsed spreadsheet rows
#[utoipa::path(
    get,
    path = "/api/files/excel/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File id"),
        RowsQuery
    ),
    responses(
        (status = 200, description = "One page of rows", body = ApiResponse<RowsPageDto>),
        (status = 400, description = "Malformed id, or file has no spreadsheet data"),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file_rows(
    State(service): State<Arc<FileService>>,
    Path(id): Path<String>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<ApiResponse<RowsPageDto>>, AppError> {
    let id = parse_file_id(&id)?;
    let response = service.get_rows(id, &query).await?;

    Ok(Json(ApiResponse::success(Some(response), None)))
}
