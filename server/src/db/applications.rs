use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{ApplicationStatus, VenueApplication};

pub struct NewApplication<'a> {
    pub venue_name: &'a str,
    pub description: Option<&'a str>,
    pub company_tax_id: Option<&'a str>,
    pub contact_email: &'a str,
    pub contact_phone: Option<&'a str>,
    pub region: Option<&'a str>,
    pub city: Option<&'a str>,
    pub address: Option<&'a str>,
}

pub async fn insert(
    ex: impl PgExecutor<'_>,
    applicant_id: Uuid,
    app: NewApplication<'_>,
) -> Result<VenueApplication, sqlx::Error> {
    sqlx::query_as::<_, VenueApplication>(
        r#"
        INSERT INTO venue_applications
            (id, applicant_id, venue_name, description, company_tax_id, contact_email,
             contact_phone, region, city, address)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(applicant_id)
    .bind(app.venue_name)
    .bind(app.description)
    .bind(app.company_tax_id)
    .bind(app.contact_email.trim().to_lowercase())
    .bind(app.contact_phone)
    .bind(app.region)
    .bind(app.city)
    .bind(app.address)
    .fetch_one(ex)
    .await
}

pub async fn list_by_status(
    ex: impl PgExecutor<'_>,
    status: ApplicationStatus,
) -> Result<Vec<VenueApplication>, sqlx::Error> {
    sqlx::query_as::<_, VenueApplication>(
        "SELECT * FROM venue_applications WHERE status = $1 ORDER BY submitted_at ASC",
    )
    .bind(status)
    .fetch_all(ex)
    .await
}

pub async fn list_for_applicant(
    ex: impl PgExecutor<'_>,
    applicant_id: Uuid,
) -> Result<Vec<VenueApplication>, sqlx::Error> {
    sqlx::query_as::<_, VenueApplication>(
        "SELECT * FROM venue_applications WHERE applicant_id = $1 ORDER BY submitted_at DESC",
    )
    .bind(applicant_id)
    .fetch_all(ex)
    .await
}

pub async fn lock(ex: impl PgExecutor<'_>, id: Uuid) -> Result<Option<VenueApplication>, sqlx::Error> {
    sqlx::query_as::<_, VenueApplication>("SELECT * FROM venue_applications WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn mark_approved(
    ex: impl PgExecutor<'_>,
    id: Uuid,
    venue_id: Uuid,
    now: DateTime<Utc>,
) -> Result<VenueApplication, sqlx::Error> {
    sqlx::query_as::<_, VenueApplication>(
        r#"
        UPDATE venue_applications
        SET status = 'approved', venue_id = $2, decided_at = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(venue_id)
    .bind(now)
    .fetch_one(ex)
    .await
}

/// Only a pending application can be rejected; `None` when it was decided
/// in the meantime.
pub async fn mark_rejected(
    ex: impl PgExecutor<'_>,
    id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Option<VenueApplication>, sqlx::Error> {
    sqlx::query_as::<_, VenueApplication>(
        r#"
        UPDATE venue_applications
        SET status = 'rejected', rejection_reason = $2, decided_at = $3
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(reason)
    .bind(now)
    .fetch_optional(ex)
    .await
}
