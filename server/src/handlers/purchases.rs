use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::Role;
use crate::services::checkout::{self, CheckoutOutcome, CheckoutRequest};
use crate::services::ratings::{self, RatingInput};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::AppResult;

pub async fn create_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CheckoutRequest>,
) -> AppResult<Response> {
    user.require_role(&[Role::Customer])?;
    checkout::validate_lines(&body.lines)?;

    let outcome = checkout::create_purchase(
        &state.pool,
        user.id,
        &body,
        state.today(),
        state.config.duplicate_purchase_window,
        Utc::now(),
    )
    .await?;

    Ok(match outcome {
        CheckoutOutcome::Created(detail) => created(detail, "Purchase created, awaiting payment"),
        CheckoutOutcome::Duplicate(detail) => success(detail, "An identical purchase is already awaiting payment"),
    })
}

pub async fn get_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let detail = checkout::get_purchase(&state.pool, &user, id).await?;
    Ok(success(detail, "Purchase retrieved"))
}

pub async fn cancel_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let purchase = checkout::cancel_purchase(&state.pool, &user, id).await?;
    Ok(success(purchase, "Purchase cancelled"))
}

pub async fn rate_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RatingInput>,
) -> AppResult<Response> {
    user.require_role(&[Role::Customer])?;
    let rating = ratings::rate_purchase(&state.pool, user.id, id, &body, state.today()).await?;
    Ok(created(rating, "Thank you for your rating"))
}
