pub mod deadlines;
pub mod health;
pub mod notifications;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::json;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(deadlines::router())
        .merge(notifications::router())
        .with_state(state)
}

/// Whole-request failure body: `{error, message}` with the given status.
pub(crate) fn failure(status: StatusCode, error: &str, message: impl ToString) -> Response {
    (
        status,
        Json(json!({ "error": error, "message": message.to_string() })),
    )
        .into_response()
}
