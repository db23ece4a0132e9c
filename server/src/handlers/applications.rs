use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db;
use crate::models::{ApplicationStatus, Role};
use crate::notifications::messages;
use crate::services::onboarding::{self, ApplicationInput};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: String,
}

pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ApplicationInput>,
) -> AppResult<Response> {
    user.require_role(&[Role::Customer])?;
    let application = onboarding::submit(&state.pool, user.id, &body).await?;
    Ok(created(application, "Application submitted"))
}

pub async fn list_mine(State(state): State<AppState>, user: AuthUser) -> AppResult<Response> {
    let applications = onboarding::list_mine(&state.pool, user.id).await?;
    Ok(success(applications, "Applications retrieved"))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StatusQuery>,
) -> AppResult<Response> {
    user.require_role(&[Role::PlatformAdmin])?;
    let status = query.status.unwrap_or(ApplicationStatus::Pending);
    let applications = onboarding::list(&state.pool, status).await?;
    Ok(success(applications, "Applications retrieved"))
}

pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_role(&[Role::PlatformAdmin])?;
    let approval = onboarding::approve(&state.pool, id, state.today(), Utc::now()).await?;

    let email = messages::application_approved(&approval.admin, &approval.venue);
    if let Err(e) = state.mailer.send(email).await {
        warn!(application_id = %id, error = %e, "Could not send approval email");
    }
    Ok(success(approval, "Application approved"))
}

pub async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> AppResult<Response> {
    user.require_role(&[Role::PlatformAdmin])?;
    let application = onboarding::reject(&state.pool, id, &body.reason, Utc::now()).await?;

    if let Some(applicant) = db::users::find(&state.pool, application.applicant_id).await? {
        let email = messages::application_rejected(&applicant, &application);
        if let Err(e) = state.mailer.send(email).await {
            warn!(application_id = %id, error = %e, "Could not send rejection email");
        }
    }
    Ok(success(application, "Application rejected"))
}
