use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::AuthUser;
use crate::db;
use crate::domain::availability::clamp_scan_days;
use crate::models::{EntryType, Role, SubscriptionState, Venue, VenuePhoto};
use crate::services::{availability, catalog, ratings, tickets};
use crate::state::AppState;
use crate::utils::response::{created, success};
use crate::utils::time::parse_date;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
    #[serde(default)]
    pub exclude_unlimited: bool,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub quantity: Option<i64>,
    pub entry_type_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct DatesQuery {
    pub from: Option<String>,
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhotoRequest {
    #[validate(
        url(message = "Photo URL is invalid"),
        custom(function = "web_address")
    )]
    pub url: String,
    #[validate(length(max = 255, message = "Caption must be at most 255 characters"))]
    pub caption: Option<String>,
}

/// Gallery photos are rendered as links, so only http(s) addresses pass.
fn web_address(url: &str) -> Result<(), ValidationError> {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        return Ok(());
    }
    let mut err = ValidationError::new("scheme");
    err.message = Some("Photo URL must be an http(s) address".into());
    Err(err)
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub plan_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub state: SubscriptionState,
}

#[derive(Serialize)]
struct VenueDetail {
    #[serde(flatten)]
    venue: Venue,
    entry_types: Vec<EntryType>,
    photos: Vec<VenuePhoto>,
}

/// Parses an optional `YYYY-MM-DD` query value, defaulting to today. Dates in
/// the past are rejected.
fn requested_date(raw: Option<&str>, today: NaiveDate) -> AppResult<NaiveDate> {
    let date = match raw {
        None => today,
        Some(raw) => parse_date(raw).ok_or_else(|| {
            AppError::ValidationError("Dates must use the YYYY-MM-DD format".to_string())
        })?,
    };
    if date < today {
        return Err(AppError::ValidationError(
            "The date cannot be in the past".to_string(),
        ));
    }
    Ok(date)
}

async fn load_venue(state: &AppState, id: Uuid) -> AppResult<Venue> {
    db::venues::find(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))
}

pub async fn list_plans(State(state): State<AppState>) -> AppResult<Response> {
    let plans = db::venues::list_plans(&state.pool).await?;
    Ok(success(plans, "Plans retrieved"))
}

pub async fn list_venues(State(state): State<AppState>) -> AppResult<Response> {
    let venues = db::venues::list_active(&state.pool).await?;
    Ok(success(venues, "Venues retrieved"))
}

pub async fn list_available(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> AppResult<Response> {
    let date = requested_date(query.date.as_deref(), state.today())?;
    let venues = availability::venues_open_on(&state.pool, date, query.exclude_unlimited).await?;
    Ok(success(venues, "Available venues retrieved"))
}

pub async fn get_venue(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Response> {
    let venue = load_venue(&state, id).await?;
    let entry_types = db::entry_types::list_for_venue(&state.pool, id, false).await?;
    let photos = db::venues::list_photos(&state.pool, id).await?;
    Ok(success(
        VenueDetail {
            venue,
            entry_types,
            photos,
        },
        "Venue retrieved",
    ))
}

pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Response> {
    let date = requested_date(query.date.as_deref(), state.today())?;
    let venue = load_venue(&state, id).await?;

    let figure = match query.entry_type_id {
        Some(entry_type_id) => {
            let entry_type = db::entry_types::find(&state.pool, entry_type_id)
                .await?
                .filter(|e| e.venue_id == venue.id)
                .ok_or_else(|| AppError::NotFound("Entry type not found".to_string()))?;
            availability::for_entry_type(&state.pool, &venue, &entry_type, date).await?
        }
        None => availability::for_venue(&state.pool, &venue, date).await?,
    };

    if let Some(quantity) = query.quantity {
        figure.check_quantity(quantity)?;
    }
    Ok(success(figure, "Availability retrieved"))
}

pub async fn get_available_dates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DatesQuery>,
) -> AppResult<Response> {
    let from = requested_date(query.from.as_deref(), state.today())?;
    let venue = load_venue(&state, id).await?;
    let dates =
        availability::available_dates(&state.pool, &venue, from, clamp_scan_days(query.days)).await?;
    Ok(success(dates, "Available dates retrieved"))
}

pub async fn add_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PhotoRequest>,
) -> AppResult<Response> {
    user.require_venue_admin(id)?;
    body.validate()?;
    let photo = catalog::add_photo(&state.pool, id, &body.url, body.caption.as_deref()).await?;
    Ok(created(photo, "Photo added"))
}

pub async fn change_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PlanRequest>,
) -> AppResult<Response> {
    user.require_role(&[Role::PlatformAdmin])?;
    let venue = catalog::change_plan(&state.pool, id, body.plan_id).await?;
    Ok(success(venue, "Plan updated"))
}

pub async fn set_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SubscriptionRequest>,
) -> AppResult<Response> {
    user.require_role(&[Role::PlatformAdmin])?;
    let venue = catalog::set_subscription(&state.pool, id, body.state, state.today()).await?;
    Ok(success(venue, "Subscription updated"))
}

pub async fn scan_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_venue_staff(id)?;
    let stats = tickets::scan_stats(&state.pool, id, Utc::now(), state.config.venue_utc_offset).await?;
    Ok(success(stats, "Scan statistics retrieved"))
}


pub async fn list_ratings(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Response> {
    load_venue(&state, id).await?;
    let ratings = ratings::list_for_venue(&state.pool, id).await?;
    Ok(success(ratings, "Ratings retrieved"))
}
