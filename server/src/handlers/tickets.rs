use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::extractor::ClientMeta;
use crate::auth::AuthUser;
use crate::services::tickets::{self, Gate};
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn validate(
    State(state): State<AppState>,
    user: AuthUser,
    meta: ClientMeta,
    Json(body): Json<ValidateRequest>,
) -> AppResult<Response> {
    let venue_id = user.worker_venue()?;
    let gate = Gate {
        pool: &state.pool,
        cipher: &state.qr,
        offset: state.config.venue_utc_offset,
    };
    let ticket = gate.admit(user.id, venue_id, &body.token, &meta, Utc::now()).await?;
    Ok(success(ticket, "Ticket valid, entry granted"))
}

pub async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Response> {
    let venue_id = user.worker_venue()?;
    let results = tickets::search(&state.pool, venue_id, &query.q).await?;
    Ok(success(results, "Search completed"))
}
