use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::Rating;

pub async fn insert(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    customer_id: Uuid,
    purchase_id: Uuid,
    score: i16,
    comment: Option<&str>,
) -> Result<Rating, sqlx::Error> {
    sqlx::query_as::<_, Rating>(
        r#"
        INSERT INTO ratings (id, venue_id, customer_id, purchase_id, score, comment)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(venue_id)
    .bind(customer_id)
    .bind(purchase_id)
    .bind(score)
    .bind(comment)
    .fetch_one(ex)
    .await
}

pub async fn list_for_venue(ex: impl PgExecutor<'_>, venue_id: Uuid, limit: i64) -> Result<Vec<Rating>, sqlx::Error> {
    sqlx::query_as::<_, Rating>(
        "SELECT * FROM ratings WHERE venue_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(venue_id)
    .bind(limit)
    .fetch_all(ex)
    .await
}

/// Recomputes the venue's cached average from its ratings.
pub async fn refresh_average(ex: impl PgExecutor<'_>, venue_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE venues
        SET rating_average = (SELECT ROUND(AVG(score)::numeric, 2) FROM ratings WHERE venue_id = $1),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(venue_id)
    .execute(ex)
    .await?;
    Ok(())
}
