use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::calls::handlers::{end_call, get_all_calls, get_chart, start_call};
use crate::features::calls::services::CallService;

/// Create routes for the calls feature
pub fn routes(call_service: Arc<CallService>) -> Router {
    Router::new()
        .route("/api/calls/start", post(start_call))
        .route("/api/calls/end", post(end_call))
        .route("/api/calls/getAll", get(get_all_calls))
        .route("/api/calls/getChart", get(get_chart))
        .with_state(call_service)
}
