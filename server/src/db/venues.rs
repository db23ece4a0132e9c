use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::models::{SubscriptionPlan, SubscriptionState, Venue, VenuePhoto};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VenueListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub venue: Venue,
    pub plan_name: Option<String>,
    pub featured: bool,
}

pub async fn list_active(ex: impl PgExecutor<'_>) -> Result<Vec<VenueListing>, sqlx::Error> {
    sqlx::query_as::<_, VenueListing>(
        r#"
        SELECT v.*, p.name AS plan_name, COALESCE(p.featured, FALSE) AS featured
        FROM venues v
        LEFT JOIN subscription_plans p ON p.id = v.plan_id
        WHERE v.subscription_state = 'active'
        ORDER BY COALESCE(p.featured, FALSE) DESC, v.name ASC
        "#,
    )
    .fetch_all(ex)
    .await
}

pub async fn find(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Venue>, sqlx::Error> {
    sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

/// Loads the venue row and holds its lock until the transaction ends.
/// Every checkout for the venue serialises on this lock.
pub async fn lock(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Venue>, sqlx::Error> {
    sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn list_plans(ex: impl PgExecutor<'_>) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlan>(
        "SELECT * FROM subscription_plans WHERE active ORDER BY commission_percent ASC",
    )
    .fetch_all(ex)
    .await
}

pub async fn find_plan(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM subscription_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

/// Assigns a plan and snapshots its commission and photo limit onto the venue.
pub async fn apply_plan(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    plan: &SubscriptionPlan,
) -> Result<Option<Venue>, sqlx::Error> {
    sqlx::query_as::<_, Venue>(
        r#"
        UPDATE venues
        SET plan_id = $2, commission_percent = $3, photo_limit = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(venue_id)
    .bind(plan.id)
    .bind(plan.commission_percent)
    .bind(plan.photo_limit)
    .fetch_optional(ex)
    .await
}

pub async fn set_subscription_state(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    state: SubscriptionState,
    today: NaiveDate,
) -> Result<Option<Venue>, sqlx::Error> {
    sqlx::query_as::<_, Venue>(
        r#"
        UPDATE venues
        SET subscription_state = $2,
            subscribed_on = CASE WHEN $2 = 'active'::subscription_state
                                 THEN COALESCE(subscribed_on, $3) ELSE subscribed_on END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(venue_id)
    .bind(state)
    .bind(today)
    .fetch_optional(ex)
    .await
}

pub async fn count_photos(ex: impl PgExecutor<'_>, venue_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM venue_photos WHERE venue_id = $1")
        .bind(venue_id)
        .fetch_one(ex)
        .await
}

pub async fn insert_photo(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    url: &str,
    caption: Option<&str>,
) -> Result<VenuePhoto, sqlx::Error> {
    sqlx::query_as::<_, VenuePhoto>(
        r#"
        INSERT INTO venue_photos (id, venue_id, url, caption)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(venue_id)
    .bind(url)
    .bind(caption)
    .fetch_one(ex)
    .await
}

pub async fn list_photos(ex: impl PgExecutor<'_>, venue_id: Uuid) -> Result<Vec<VenuePhoto>, sqlx::Error> {
    sqlx::query_as::<_, VenuePhoto>(
        "SELECT * FROM venue_photos WHERE venue_id = $1 ORDER BY created_at ASC",
    )
    .bind(venue_id)
    .fetch_all(ex)
    .await
}

pub struct NewVenue<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub region: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
}

/// Creates an active venue on the default commission and photo allowance.
pub async fn insert(ex: impl PgExecutor<'_>, venue: NewVenue<'_>, today: NaiveDate) -> Result<Venue, sqlx::Error> {
    sqlx::query_as::<_, Venue>(
        r#"
        INSERT INTO venues
            (id, name, description, address, city, region, phone, email,
             subscription_state, subscribed_on)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(venue.name)
    .bind(venue.description)
    .bind(venue.address)
    .bind(venue.city)
    .bind(venue.region)
    .bind(venue.phone)
    .bind(venue.email)
    .bind(today)
    .fetch_one(ex)
    .await
}
