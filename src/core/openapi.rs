use utoipa::{Modify, OpenApi};

use crate::features::calls::{dtos as calls_dtos, handlers as calls_handlers};
use crate::features::feedback::{dtos as feedback_dtos, handlers as feedback_handlers};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::get_file,
        files_handlers::update_file,
        files_handlers::delete_file,
        files_handlers::download_file,
        files_handlers::get_file_rows,
        // Calls
        calls_handlers::start_call,
        calls_handlers::end_call,
        calls_handlers::get_all_calls,
        calls_handlers::get_chart,
        // Feedback
        feedback_handlers::create_feedback,
    ),
    components(
        schemas(
            // Files
            files_dtos::UploadFileDto,
            files_dtos::FileSummaryDto,
            files_dtos::FileListItemDto,
            files_dtos::ListPaginationDto,
            files_dtos::FileListDto,
            files_dtos::FileDetailDto,
            files_dtos::DeleteFileResponseDto,
            files_dtos::RowsFileInfoDto,
            files_dtos::SheetInfoDto,
            files_dtos::RowsPaginationDto,
            files_dtos::RowsPageDto,
            // Calls
            calls_dtos::StartCallDto,
            calls_dtos::CallStartedDto,
            calls_dtos::EndCallDto,
            calls_dtos::CallEndedDto,
            calls_dtos::CallDto,
            calls_dtos::DayCountDto,
            calls_dtos::WeeklyChartDto,
            // Feedback
            feedback_dtos::CreateFeedbackDto,
            feedback_dtos::FeedbackDto,
        )
    ),
    tags(
        (name = "files", description = "Spreadsheet upload and file management"),
        (name = "calls", description = "Call session tracking and weekly usage chart"),
        (name = "feedback", description = "Feedback entries tied to uploaded files"),
    )
)]
pub struct ApiDoc;

/// Overrides OpenAPI info with values from configuration
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
