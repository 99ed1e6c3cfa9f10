use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, download_file, get_file, get_file_rows, list_files, update_file, upload_file,
};
use crate::features::files::services::FileService;
use crate::shared::constants::MAX_UPLOAD_SIZE;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    // Allow body size up to MAX_UPLOAD_SIZE + buffer for multipart overhead
    let body_limit = DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 1024 * 1024);

    Router::new()
        .route(
            "/api/files/upload",
            post(upload_file).layer(body_limit.clone()),
        )
        .route("/api/files", get(list_files))
        .route(
            "/api/files/{id}",
            get(get_file)
                .put(update_file)
                .delete(delete_file)
                .layer(body_limit),
        )
        .route("/api/files/download/{id}", get(download_file))
        .route("/api/files/excel/{id}", get(get_file_rows))
        .with_state(file_service)
}
