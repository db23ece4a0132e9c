//! Venue-side catalogue management: entry types, photos and plans.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::{self, entry_types::EntryTypeFields};
use crate::models::{DurationKind, EntryType, SubscriptionState, Venue, VenuePhoto};
use crate::utils::{AppError, AppResult};

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct EntryTypeInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_kind: DurationKind,
    pub duration_hours: Option<i32>,
    pub daily_capacity: Option<i32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl EntryTypeInput {
    pub fn validate(&self) -> AppResult<EntryTypeFields<'_>> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Name must be between 1 and {MAX_NAME_LEN} characters"
            )));
        }
        // Stored with two decimals; a price that rounds to zero is no price.
        let price = self.price.round_dp(2);
        if price <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Price must be at least 0.01".to_string(),
            ));
        }
        if matches!(self.duration_hours, Some(h) if !(1..=72).contains(&h)) {
            return Err(AppError::ValidationError(
                "Duration must be between 1 and 72 hours".to_string(),
            ));
        }
        if matches!(self.daily_capacity, Some(c) if c < 1) {
            return Err(AppError::ValidationError(
                "Daily capacity must be at least 1".to_string(),
            ));
        }

        Ok(EntryTypeFields {
            name,
            description: self.description.as_deref().map(str::trim).filter(|d| !d.is_empty()),
            price,
            duration_kind: self.duration_kind,
            duration_hours: self
                .duration_hours
                .unwrap_or_else(|| self.duration_kind.default_hours()),
            daily_capacity: self.daily_capacity,
        })
    }
}

pub async fn create_entry_type(pool: &PgPool, venue_id: Uuid, input: &EntryTypeInput) -> AppResult<EntryType> {
    let fields = input.validate()?;
    if db::venues::find(pool, venue_id).await?.is_none() {
        return Err(AppError::NotFound("Venue not found".to_string()));
    }
    if db::entry_types::name_taken(pool, venue_id, fields.name, None).await? {
        return Err(AppError::Conflict(format!(
            "An entry type named '{}' already exists",
            fields.name
        )));
    }

    let created = db::entry_types::insert(pool, venue_id, fields).await?;
    info!(entry_type_id = %created.id, venue_id = %venue_id, "Entry type created");
    Ok(created)
}

pub async fn update_entry_type(pool: &PgPool, current: &EntryType, input: &EntryTypeInput) -> AppResult<EntryType> {
    let fields = input.validate()?;
    if db::entry_types::name_taken(pool, current.venue_id, fields.name, Some(current.id)).await? {
        return Err(AppError::Conflict(format!(
            "An entry type named '{}' already exists",
            fields.name
        )));
    }

    db::entry_types::update(pool, current.id, fields, input.active)
        .await?
        .ok_or_else(|| AppError::NotFound("Entry type not found".to_string()))
}

/// Adds a gallery photo within the plan's photo allowance.
pub async fn add_photo(pool: &PgPool, venue_id: Uuid, url: &str, caption: Option<&str>) -> AppResult<VenuePhoto> {
    let url = url.trim();
    let mut tx = pool.begin().await?;
    let venue = db::venues::lock(&mut *tx, venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))?;
    let current = db::venues::count_photos(&mut *tx, venue_id).await?;
    if !venue.can_add_photo(current) {
        return Err(AppError::Conflict(format!(
            "Your plan allows {} photo(s); remove one or upgrade the plan",
            venue.photo_limit
        )));
    }

    let photo = db::venues::insert_photo(&mut *tx, venue_id, url, caption).await?;
    tx.commit().await?;
    Ok(photo)
}

pub async fn change_plan(pool: &PgPool, venue_id: Uuid, plan_id: Uuid) -> AppResult<Venue> {
    let plan = db::venues::find_plan(pool, plan_id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;

    let venue = db::venues::apply_plan(pool, venue_id, &plan)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))?;
    info!(venue_id = %venue_id, plan = %plan.name, commission = %plan.commission_percent, "Venue plan changed");
    Ok(venue)
}

pub async fn set_subscription(
    pool: &PgPool,
    venue_id: Uuid,
    state: SubscriptionState,
    today: NaiveDate,
) -> AppResult<Venue> {
    let venue = db::venues::set_subscription_state(pool, venue_id, state, today)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))?;
    info!(venue_id = %venue_id, state = ?state, "Venue subscription updated");
    Ok(venue)
}
