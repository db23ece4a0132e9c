use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::models::{DurationKind, Purchase, PurchaseLine};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct CommittedCounts {
    pub sold: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct DailyCounts {
    pub visit_date: NaiveDate,
    pub sold: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LineDetail {
    pub entry_type_id: Uuid,
    pub entry_type_name: String,
    pub duration_kind: DurationKind,
    pub duration_hours: Option<i32>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TicketSearchRow {
    pub purchase_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub visit_date: NaiveDate,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub used: Option<bool>,
    pub used_at: Option<DateTime<Utc>>,
}

pub struct NewLine {
    pub entry_type_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

pub async fn committed_for_venue(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    visit_date: NaiveDate,
) -> Result<CommittedCounts, sqlx::Error> {
    sqlx::query_as::<_, CommittedCounts>(
        r#"
        SELECT
            COALESCE(SUM(quantity) FILTER (WHERE status = 'paid'), 0)::BIGINT AS sold,
            COALESCE(SUM(quantity) FILTER (WHERE status = 'pending'), 0)::BIGINT AS pending
        FROM purchases
        WHERE venue_id = $1 AND visit_date = $2 AND status IN ('pending', 'paid')
        "#,
    )
    .bind(venue_id)
    .bind(visit_date)
    .fetch_one(ex)
    .await
}

pub async fn committed_for_entry_type(
    ex: impl PgExecutor<'_>,
    entry_type_id: Uuid,
    visit_date: NaiveDate,
) -> Result<CommittedCounts, sqlx::Error> {
    sqlx::query_as::<_, CommittedCounts>(
        r#"
        SELECT
            COALESCE(SUM(l.quantity) FILTER (WHERE p.status = 'paid'), 0)::BIGINT AS sold,
            COALESCE(SUM(l.quantity) FILTER (WHERE p.status = 'pending'), 0)::BIGINT AS pending
        FROM purchase_lines l
        JOIN purchases p ON p.id = l.purchase_id
        WHERE l.entry_type_id = $1 AND p.visit_date = $2 AND p.status IN ('pending', 'paid')
        "#,
    )
    .bind(entry_type_id)
    .bind(visit_date)
    .fetch_one(ex)
    .await
}

/// Committed counts for every date in `[from, to]` that has any purchases.
pub async fn committed_by_date(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyCounts>, sqlx::Error> {
    sqlx::query_as::<_, DailyCounts>(
        r#"
        SELECT
            visit_date,
            COALESCE(SUM(quantity) FILTER (WHERE status = 'paid'), 0)::BIGINT AS sold,
            COALESCE(SUM(quantity) FILTER (WHERE status = 'pending'), 0)::BIGINT AS pending
        FROM purchases
        WHERE venue_id = $1 AND visit_date BETWEEN $2 AND $3 AND status IN ('pending', 'paid')
        GROUP BY visit_date
        "#,
    )
    .bind(venue_id)
    .bind(from)
    .bind(to)
    .fetch_all(ex)
    .await
}

pub async fn find_recent_duplicate(
    ex: impl PgExecutor<'_>,
    customer_id: Uuid,
    venue_id: Uuid,
    visit_date: NaiveDate,
    quantity: i32,
    since: DateTime<Utc>,
) -> Result<Option<Purchase>, sqlx::Error> {
    sqlx::query_as::<_, Purchase>(
        r#"
        SELECT * FROM purchases
        WHERE customer_id = $1 AND venue_id = $2 AND visit_date = $3
          AND quantity = $4 AND status = 'pending' AND created_at >= $5
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(customer_id)
    .bind(venue_id)
    .bind(visit_date)
    .bind(quantity)
    .bind(since)
    .fetch_optional(ex)
    .await
}

pub async fn insert(
    ex: impl PgExecutor<'_>,
    customer_id: Uuid,
    venue_id: Uuid,
    visit_date: NaiveDate,
    quantity: i32,
    total: Decimal,
) -> Result<Purchase, sqlx::Error> {
    sqlx::query_as::<_, Purchase>(
        r#"
        INSERT INTO purchases (id, customer_id, venue_id, visit_date, quantity, total, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(customer_id)
    .bind(venue_id)
    .bind(visit_date)
    .bind(quantity)
    .bind(total)
    .fetch_one(ex)
    .await
}

pub async fn insert_line(
    ex: impl PgExecutor<'_>,
    purchase_id: Uuid,
    line: &NewLine,
) -> Result<PurchaseLine, sqlx::Error> {
    sqlx::query_as::<_, PurchaseLine>(
        r#"
        INSERT INTO purchase_lines (id, purchase_id, entry_type_id, quantity, unit_price, subtotal)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(purchase_id)
    .bind(line.entry_type_id)
    .bind(line.quantity)
    .bind(line.unit_price)
    .bind(line.unit_price * Decimal::from(line.quantity))
    .fetch_one(ex)
    .await
}

pub async fn find(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Purchase>, sqlx::Error> {
    sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn lock(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Purchase>, sqlx::Error> {
    sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn line_details(ex: impl PgExecutor<'_>, purchase_id: Uuid) -> Result<Vec<LineDetail>, sqlx::Error> {
    sqlx::query_as::<_, LineDetail>(
        r#"
        SELECT l.entry_type_id, e.name AS entry_type_name, e.duration_kind, e.duration_hours,
               l.quantity, l.unit_price, l.subtotal
        FROM purchase_lines l
        JOIN entry_types e ON e.id = l.entry_type_id
        WHERE l.purchase_id = $1
        ORDER BY e.name
        "#,
    )
    .bind(purchase_id)
    .fetch_all(ex)
    .await
}

/// Moves a pending purchase to cancelled. Returns `None` when it was not pending.
pub async fn cancel_pending(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Purchase>, sqlx::Error> {
    sqlx::query_as::<_, Purchase>(
        r#"
        UPDATE purchases SET status = 'cancelled', updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(ex)
    .await
}

pub async fn mark_paid(
    ex: impl PgExecutor<'_>,
    id: Uuid,
    payment_id: &str,
    payer_email: Option<&str>,
    amount: Decimal,
    paid_at: DateTime<Utc>,
) -> Result<Purchase, sqlx::Error> {
    sqlx::query_as::<_, Purchase>(
        r#"
        UPDATE purchases
        SET status = 'paid', payment_id = $2, payer_email = $3, amount_paid = $4,
            paid_at = $5, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payment_id)
    .bind(payer_email)
    .bind(amount)
    .bind(paid_at)
    .fetch_one(ex)
    .await
}

/// Expires pending purchases created before `cutoff`, releasing their seats.
pub async fn expire_pending_before(ex: impl PgExecutor<'_>, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE purchases SET status = 'expired', updated_at = NOW()
        WHERE status = 'pending' AND created_at < $1
        "#,
    )
    .bind(cutoff)
    .execute(ex)
    .await?;
    Ok(result.rows_affected())
}

pub async fn search_paid_for_venue(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    query: &str,
) -> Result<Vec<TicketSearchRow>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(query.trim()));
    sqlx::query_as::<_, TicketSearchRow>(
        r#"
        SELECT p.id AS purchase_id,
               TRIM(u.first_name || ' ' || u.last_name) AS customer_name,
               u.email AS customer_email,
               p.visit_date, p.quantity, p.created_at,
               q.used, q.used_at
        FROM purchases p
        JOIN users u ON u.id = p.customer_id
        LEFT JOIN qr_codes q ON q.purchase_id = p.id
        WHERE p.venue_id = $1 AND p.status = 'paid'
          AND (u.email ILIKE $2 OR (u.first_name || ' ' || u.last_name) ILIKE $2)
        ORDER BY p.visit_date DESC, p.created_at DESC
        LIMIT 10
        "#,
    )
    .bind(venue_id)
    .bind(pattern)
    .fetch_all(ex)
    .await
}

pub async fn paid_without_distribution(ex: impl PgExecutor<'_>) -> Result<Vec<Purchase>, sqlx::Error> {
    sqlx::query_as::<_, Purchase>(
        r#"
        SELECT p.* FROM purchases p
        LEFT JOIN payment_distributions d ON d.purchase_id = p.id
        WHERE p.status = 'paid' AND d.id IS NULL
        ORDER BY p.paid_at ASC NULLS LAST
        "#,
    )
    .fetch_all(ex)
    .await
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ana_100%"), "ana\\_100\\%");
        assert_eq!(escape_like("plain"), "plain");
    }
}
