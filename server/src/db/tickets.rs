use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::models::{QrCode, ScanLog};

pub struct NewScanLog<'a> {
    pub qr_code_id: Uuid,
    pub scanned_by: Uuid,
    pub success: bool,
    pub message: &'a str,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, FromRow)]
pub struct ScanCounts {
    pub scanned_today: i64,
    pub scanned_this_month: i64,
    pub failed_today: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecentScan {
    pub purchase_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub visit_date: NaiveDate,
    pub quantity: i32,
    pub used_at: DateTime<Utc>,
}

pub async fn insert_qr(ex: impl PgExecutor<'_>, purchase_id: Uuid, token: &str) -> Result<QrCode, sqlx::Error> {
    sqlx::query_as::<_, QrCode>(
        r#"
        INSERT INTO qr_codes (id, purchase_id, token)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(purchase_id)
    .bind(token)
    .fetch_one(ex)
    .await
}

pub async fn find_by_purchase(ex: impl PgExecutor<'_>, purchase_id: Uuid) -> Result<Option<QrCode>, sqlx::Error> {
    sqlx::query_as::<_, QrCode>("SELECT * FROM qr_codes WHERE purchase_id = $1")
        .bind(purchase_id)
        .fetch_optional(ex)
        .await
}

/// Consumes the code. Returns `None` if another scan already consumed it.
pub async fn consume(
    ex: impl PgExecutor<'_>,
    qr_code_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<QrCode>, sqlx::Error> {
    sqlx::query_as::<_, QrCode>(
        r#"
        UPDATE qr_codes SET used = TRUE, used_at = $2
        WHERE id = $1 AND used = FALSE
        RETURNING *
        "#,
    )
    .bind(qr_code_id)
    .bind(now)
    .fetch_optional(ex)
    .await
}

pub async fn insert_scan_log(ex: impl PgExecutor<'_>, log: NewScanLog<'_>) -> Result<ScanLog, sqlx::Error> {
    sqlx::query_as::<_, ScanLog>(
        r#"
        INSERT INTO scan_logs (id, qr_code_id, scanned_by, success, message, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(log.qr_code_id)
    .bind(log.scanned_by)
    .bind(log.success)
    .bind(log.message)
    .bind(log.ip_address)
    .bind(log.user_agent)
    .fetch_one(ex)
    .await
}

/// Scan counters for a venue; the bounds are UTC instants of the venue-local
/// day and month starts. Admissions count against the ticket's venue, failed
/// attempts against the venue of the worker who scanned.
pub async fn scan_counts(
    ex: impl PgExecutor<'_>,
    venue_id: Uuid,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
    month_start: DateTime<Utc>,
) -> Result<ScanCounts, sqlx::Error> {
    sqlx::query_as::<_, ScanCounts>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE s.success AND p.venue_id = $1 AND s.scanned_at >= $2) AS scanned_today,
            COUNT(*) FILTER (WHERE s.success AND p.venue_id = $1 AND s.scanned_at >= $4) AS scanned_this_month,
            COUNT(*) FILTER (WHERE NOT s.success AND w.venue_id = $1 AND s.scanned_at >= $2) AS failed_today
        FROM scan_logs s
        JOIN qr_codes q ON q.id = s.qr_code_id
        JOIN purchases p ON p.id = q.purchase_id
        LEFT JOIN users w ON w.id = s.scanned_by
        WHERE (p.venue_id = $1 OR w.venue_id = $1)
          AND s.scanned_at >= LEAST($2, $4)
          AND s.scanned_at < $3
        "#,
    )
    .bind(venue_id)
    .bind(day_start)
    .bind(day_end)
    .bind(month_start)
    .fetch_one(ex)
    .await
}

pub async fn recent_scans(ex: impl PgExecutor<'_>, venue_id: Uuid, limit: i64) -> Result<Vec<RecentScan>, sqlx::Error> {
    sqlx::query_as::<_, RecentScan>(
        r#"
        SELECT p.id AS purchase_id,
               TRIM(u.first_name || ' ' || u.last_name) AS customer_name,
               u.email AS customer_email,
               p.visit_date, p.quantity, q.used_at AS used_at
        FROM qr_codes q
        JOIN purchases p ON p.id = q.purchase_id
        JOIN users u ON u.id = p.customer_id
        WHERE p.venue_id = $1 AND q.used AND q.used_at IS NOT NULL
        ORDER BY q.used_at DESC
        LIMIT $2
        "#,
    )
    .bind(venue_id)
    .bind(limit)
    .fetch_all(ex)
    .await
}
