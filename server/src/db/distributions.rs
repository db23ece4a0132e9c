use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::domain::commission::Split;
use crate::models::{DistributionStatus, PaymentDistribution};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusTotals {
    pub status: DistributionStatus,
    pub count: i64,
    pub gross: Decimal,
    pub commission: Decimal,
    pub venue_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OverallTotals {
    pub distributions: i64,
    pub gross: Decimal,
    pub commission: Decimal,
    pub venue_amount: Decimal,
    pub average_percent: Option<Decimal>,
    pub paid_purchases: i64,
    pub paid_without_distribution: i64,
}

/// Inserts the distribution for a purchase, already in `processed` state.
/// Returns `None` when the purchase already has one.
pub async fn insert_processed(
    ex: impl PgExecutor<'_>,
    purchase_id: Uuid,
    venue_id: Uuid,
    plan_id: Option<Uuid>,
    split: &Split,
    now: DateTime<Utc>,
) -> Result<Option<PaymentDistribution>, sqlx::Error> {
    sqlx::query_as::<_, PaymentDistribution>(
        r#"
        INSERT INTO payment_distributions
            (id, purchase_id, venue_id, plan_id, gross_amount, commission_percent,
             commission_amount, venue_amount, status, calculated_at, processed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'processed', $9, $9)
        ON CONFLICT (purchase_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(purchase_id)
    .bind(venue_id)
    .bind(plan_id)
    .bind(split.gross)
    .bind(split.percent)
    .bind(split.commission)
    .bind(split.venue_amount)
    .bind(now)
    .fetch_optional(ex)
    .await
}

pub async fn lock(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<PaymentDistribution>, sqlx::Error> {
    sqlx::query_as::<_, PaymentDistribution>(
        "SELECT * FROM payment_distributions WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(ex)
    .await
}

pub async fn apply_split(
    ex: impl PgExecutor<'_>,
    id: Uuid,
    split: &Split,
    now: DateTime<Utc>,
) -> Result<PaymentDistribution, sqlx::Error> {
    sqlx::query_as::<_, PaymentDistribution>(
        r#"
        UPDATE payment_distributions
        SET gross_amount = $2, commission_percent = $3, commission_amount = $4,
            venue_amount = $5, calculated_at = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(split.gross)
    .bind(split.percent)
    .bind(split.commission)
    .bind(split.venue_amount)
    .bind(now)
    .fetch_one(ex)
    .await
}

pub async fn mark_paid_out(
    ex: impl PgExecutor<'_>,
    id: Uuid,
    reference: &str,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<PaymentDistribution, sqlx::Error> {
    sqlx::query_as::<_, PaymentDistribution>(
        r#"
        UPDATE payment_distributions
        SET status = 'paid_out', payout_reference = $2, notes = COALESCE($3, notes), paid_out_at = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(reference)
    .bind(notes)
    .bind(now)
    .fetch_one(ex)
    .await
}

pub async fn mark_failed(
    ex: impl PgExecutor<'_>,
    id: Uuid,
    notes: &str,
) -> Result<PaymentDistribution, sqlx::Error> {
    sqlx::query_as::<_, PaymentDistribution>(
        "UPDATE payment_distributions SET status = 'failed', notes = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(notes)
    .fetch_one(ex)
    .await
}

pub async fn totals_by_status(ex: impl PgExecutor<'_>) -> Result<Vec<StatusTotals>, sqlx::Error> {
    sqlx::query_as::<_, StatusTotals>(
        r#"
        SELECT status, COUNT(*) AS count,
               COALESCE(SUM(gross_amount), 0) AS gross,
               COALESCE(SUM(commission_amount), 0) AS commission,
               COALESCE(SUM(venue_amount), 0) AS venue_amount
        FROM payment_distributions
        GROUP BY status
        ORDER BY status
        "#,
    )
    .fetch_all(ex)
    .await
}

pub async fn overall_totals(ex: impl PgExecutor<'_>) -> Result<OverallTotals, sqlx::Error> {
    sqlx::query_as::<_, OverallTotals>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM payment_distributions) AS distributions,
            (SELECT COALESCE(SUM(gross_amount), 0) FROM payment_distributions) AS gross,
            (SELECT COALESCE(SUM(commission_amount), 0) FROM payment_distributions) AS commission,
            (SELECT COALESCE(SUM(venue_amount), 0) FROM payment_distributions) AS venue_amount,
            (SELECT ROUND(AVG(commission_percent), 2) FROM payment_distributions) AS average_percent,
            (SELECT COUNT(*) FROM purchases WHERE status = 'paid') AS paid_purchases,
            (SELECT COUNT(*) FROM purchases p
               WHERE p.status = 'paid'
                 AND NOT EXISTS (SELECT 1 FROM payment_distributions d WHERE d.purchase_id = p.id)
            ) AS paid_without_distribution
        "#,
    )
    .fetch_one(ex)
    .await
}
