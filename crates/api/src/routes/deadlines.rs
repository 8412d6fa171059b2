//! Scan-and-notify trigger.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::middleware::auth::CronAuth;
use crate::routes::failure;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/check-deadlines", get(check_deadlines).post(check_deadlines))
}

/// Run one cycle at the current time and return its report.
async fn check_deadlines(_auth: CronAuth, State(state): State<AppState>) -> Response {
    match state.context.processor().run_cycle(Utc::now()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Deadline check failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to check deadlines", e)
        }
    }
}
