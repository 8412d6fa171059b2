//! Shared-secret guard for the scan endpoint.
//!
//! When `CRON_SECRET` is configured, callers must send
//! `Authorization: Bearer <secret>`. Without it the endpoint is open.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use taskping_common::error::AppError;

use crate::state::AppState;

/// Marker extractor: present on a handler means the caller passed the
/// cron secret check.
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

/// Check an `Authorization` header value against the expected secret.
pub fn verify_bearer(header: Option<&str>, secret: &str) -> Result<(), AppError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("Missing bearer token".to_string()))?;

    if token.trim() != secret {
        return Err(AppError::Auth("Invalid cron secret".to_string()));
    }
    Ok(())
}

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(secret) = state.config().cron_secret.as_deref() else {
            return Ok(CronAuth);
        };

        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());

        verify_bearer(header, secret).inspect_err(|_| {
            tracing::warn!(path = %parts.uri.path(), "Rejected scan request without valid cron secret");
        })?;
        Ok(CronAuth)
    }
}
