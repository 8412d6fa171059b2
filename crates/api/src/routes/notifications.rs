//! Ad-hoc notification endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use taskping_engine::on_demand::SendNotificationRequest;

use crate::routes::failure;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/send-notification", post(send_notification))
}

async fn send_notification(
    State(state): State<AppState>,
    payload: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Rejected notification payload");
            return failure(
                StatusCode::BAD_REQUEST,
                "Failed to process request",
                rejection.body_text(),
            );
        }
    };

    Json(state.context.on_demand().send(&request).await).into_response()
}
