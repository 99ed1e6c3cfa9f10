use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::feedback::handlers::create_feedback;
use crate::features::feedback::services::FeedbackService;

/// Create routes for the feedback feature
pub fn routes(feedback_service: Arc<FeedbackService>) -> Router {
    Router::new()
        .route("/api/feedback/{id}", post(create_feedback))
        .with_state(feedback_service)
}
