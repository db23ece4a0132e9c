//! Customer ratings. One rating per paid purchase, allowed from the visit
//! date on; the venue keeps a cached average.

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::db;
use crate::models::{Purchase, PurchaseStatus, Rating};
use crate::utils::validation::optional_text;
use crate::utils::{AppError, AppResult};

pub const RECENT_RATINGS: i64 = 50;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RatingInput {
    #[validate(range(min = 1, max = 5, message = "Score must be between 1 and 5"))]
    pub score: i16,
    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

fn check_eligible(purchase: &Purchase, customer_id: Uuid, today: NaiveDate) -> AppResult<()> {
    if purchase.customer_id != customer_id {
        return Err(AppError::NotFound("Purchase not found".to_string()));
    }
    if purchase.status != PurchaseStatus::Paid {
        return Err(AppError::Conflict(
            "Only paid purchases can be rated".to_string(),
        ));
    }
    if purchase.visit_date > today {
        return Err(AppError::ValidationError(
            "You can rate the venue from the day of your visit".to_string(),
        ));
    }
    Ok(())
}

pub async fn rate_purchase(
    pool: &PgPool,
    customer_id: Uuid,
    purchase_id: Uuid,
    input: &RatingInput,
    today: NaiveDate,
) -> AppResult<Rating> {
    input.validate()?;
    let purchase = db::purchases::find(pool, purchase_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase not found".to_string()))?;
    check_eligible(&purchase, customer_id, today)?;

    let mut tx = pool.begin().await?;
    let rating = db::ratings::insert(
        &mut *tx,
        purchase.venue_id,
        customer_id,
        purchase.id,
        input.score,
        optional_text(&input.comment),
    )
    .await?;
    db::ratings::refresh_average(&mut *tx, purchase.venue_id).await?;
    tx.commit().await?;

    info!(purchase_id = %purchase.id, venue_id = %purchase.venue_id, score = input.score, "Venue rated");
    Ok(rating)
}

pub async fn list_for_venue(pool: &PgPool, venue_id: Uuid) -> AppResult<Vec<Rating>> {
    Ok(db::ratings::list_for_venue(pool, venue_id, RECENT_RATINGS).await?)
}
