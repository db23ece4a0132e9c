use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::Utc;
use serde_json::json;

use crate::services::payments::{self, PaymentNotification, SIGNATURE_HEADER};
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::{AppError, AppResult};

/// Gateway callback. The signature covers the raw body, so it is checked
/// before the payload is parsed.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> AppResult<Response> {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    payments::verify_signature(&state.config.webhook_secret, &body, signature)?;

    let notification: PaymentNotification = serde_json::from_slice(&body)
        .map_err(|e| AppError::ValidationError(format!("Malformed payment notification: {e}")))?;

    let outcome = payments::handle_notification(&state, &notification, Utc::now()).await?;
    Ok(success(json!({ "outcome": outcome }), "Notification processed"))
}
