use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{DurationKind, EntryType};

pub struct EntryTypeFields<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub duration_kind: DurationKind,
    pub duration_hours: i32,
    pub daily_capacity: Option<i32>,
}

pub async fn list_for_venue(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    include_inactive: bool,
) -> Result<Vec<EntryType>, sqlx::Error> {
    sqlx::query_as::<_, EntryType>(
        r#"
        SELECT * FROM entry_types
        WHERE venue_id = $1 AND (active OR $2)
        ORDER BY price ASC, name ASC
        "#,
    )
    .bind(venue_id)
    .bind(include_inactive)
    .fetch_all(ex)
    .await
}

pub async fn find(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<EntryType>, sqlx::Error> {
    sqlx::query_as::<_, EntryType>("SELECT * FROM entry_types WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn find_many(ex: impl PgExecutor<'_>, ids: &[Uuid]) -> Result<Vec<EntryType>, sqlx::Error> {
    sqlx::query_as::<_, EntryType>("SELECT * FROM entry_types WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(ex)
        .await
}

pub async fn name_taken(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM entry_types
            WHERE venue_id = $1 AND lower(name) = lower($2) AND ($3::uuid IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(venue_id)
    .bind(name.trim())
    .bind(except)
    .fetch_one(ex)
    .await
}

pub async fn insert(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    fields: EntryTypeFields<'_>,
) -> Result<EntryType, sqlx::Error> {
    sqlx::query_as::<_, EntryType>(
        r#"
        INSERT INTO entry_types
            (id, venue_id, name, description, price, duration_kind, duration_hours, daily_capacity)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(venue_id)
    .bind(fields.name.trim())
    .bind(fields.description)
    .bind(fields.price)
    .bind(fields.duration_kind)
    .bind(fields.duration_hours)
    .bind(fields.daily_capacity)
    .fetch_one(ex)
    .await
}

pub async fn update(
    ex: impl PgExecutor<'_>,
    id: Uuid,
    fields: EntryTypeFields<'_>,
    active: bool,
) -> Result<Option<EntryType>, sqlx::Error> {
    sqlx::query_as::<_, EntryType>(
        r#"
        UPDATE entry_types
        SET name = $2, description = $3, price = $4, duration_kind = $5,
            duration_hours = $6, daily_capacity = $7, active = $8, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(fields.name.trim())
    .bind(fields.description)
    .bind(fields.price)
    .bind(fields.duration_kind)
    .bind(fields.duration_hours)
    .bind(fields.daily_capacity)
    .bind(active)
    .fetch_optional(ex)
    .await
}

pub async fn deactivate(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<EntryType>, sqlx::Error> {
    sqlx::query_as::<_, EntryType>(
        "UPDATE entry_types SET active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(ex)
    .await
}
