use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db;
use crate::models::EntryType;
use crate::services::catalog::{self, EntryTypeInput};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::{AppError, AppResult};

async fn load(state: &AppState, id: Uuid) -> AppResult<EntryType> {
    db::entry_types::find(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Entry type not found".to_string()))
}

pub async fn list(State(state): State<AppState>, Path(venue_id): Path<Uuid>) -> AppResult<Response> {
    let entry_types = db::entry_types::list_for_venue(&state.pool, venue_id, false).await?;
    Ok(success(entry_types, "Entry types retrieved"))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Path(venue_id): Path<Uuid>,
    Json(body): Json<EntryTypeInput>,
) -> AppResult<Response> {
    user.require_venue_admin(venue_id)?;
    let entry_type = catalog::create_entry_type(&state.pool, venue_id, &body).await?;
    Ok(created(entry_type, "Entry type created"))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<EntryTypeInput>,
) -> AppResult<Response> {
    body.validate()?;
    let current = load(&state, id).await?;
    user.require_venue_admin(current.venue_id)?;
    let entry_type = catalog::update_entry_type(&state.pool, &current, &body).await?;
    Ok(success(entry_type, "Entry type updated"))
}

/// Entry types are referenced by past purchases, so deletion only retires them.
pub async fn deactivate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let current = load(&state, id).await?;
    user.require_venue_admin(current.venue_id)?;
    let entry_type = db::entry_types::deactivate(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Entry type not found".to_string()))?;
    Ok(success(entry_type, "Entry type deactivated"))
}
