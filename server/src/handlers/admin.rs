use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::Role;
use crate::services::{checkout, distributions};
use crate::state::AppState;
use crate::utils::response::success;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct PayoutRequest {
    pub reference: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FailRequest {
    pub notes: String,
}

fn require_admin(user: &AuthUser) -> AppResult<()> {
    user.require_role(&[Role::PlatformAdmin])
}

pub async fn distribution_summary(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    require_admin(&user)?;
    let summary = distributions::summary(&state.pool).await?;
    Ok(success(summary, "Distribution summary retrieved"))
}

pub async fn backfill_distributions(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    require_admin(&user)?;
    let report = distributions::backfill(&state.pool, Utc::now()).await?;
    Ok(success(report, "Backfill finished"))
}

pub async fn recalculate_distribution(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    require_admin(&user)?;
    let distribution = distributions::recalculate(&state.pool, id, Utc::now()).await?;
    Ok(success(distribution, "Distribution recalculated"))
}

pub async fn payout_distribution(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PayoutRequest>,
) -> AppResult<Response> {
    require_admin(&user)?;
    let distribution =
        distributions::mark_paid_out(&state.pool, id, &body.reference, body.notes.as_deref(), Utc::now())
            .await?;
    Ok(success(distribution, "Distribution marked as paid out"))
}

pub async fn fail_distribution(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<FailRequest>,
) -> AppResult<Response> {
    require_admin(&user)?;
    let distribution = distributions::mark_failed(&state.pool, id, &body.notes).await?;
    Ok(success(distribution, "Distribution marked as failed"))
}

pub async fn expire_purchases(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    require_admin(&user)?;
    let expired =
        checkout::expire_stale_pending(&state.pool, state.config.pending_purchase_ttl, Utc::now()).await?;
    Ok(success(json!({ "expired": expired }), "Stale purchases expired"))
}
