//! Venue onboarding. Customers apply to list a venue; a platform admin
//! approves, which creates the venue and makes the applicant its admin, or
//! rejects with a reason.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::db::{self, applications::NewApplication, venues::NewVenue};
use crate::models::{ApplicationStatus, User, Venue, VenueApplication};
use crate::utils::validation::{not_blank, optional_text};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplicationInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Venue name must be at most 100 characters")
    )]
    pub venue_name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 20, message = "Company tax id must be at most 20 characters"))]
    pub company_tax_id: Option<String>,
    #[validate(email(message = "A valid contact email is required"))]
    pub contact_email: String,
    #[validate(length(max = 30, message = "Contact phone must be at most 30 characters"))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

/// Outcome of an approval: the decided application, the new venue and its
/// administrator.
#[derive(Debug, Serialize)]
pub struct Approval {
    pub application: VenueApplication,
    pub venue: Venue,
    pub admin: User,
}

pub async fn submit(pool: &PgPool, applicant_id: Uuid, input: &ApplicationInput) -> AppResult<VenueApplication> {
    input.validate()?;
    let application = db::applications::insert(
        pool,
        applicant_id,
        NewApplication {
            venue_name: input.venue_name.trim(),
            description: optional_text(&input.description),
            company_tax_id: optional_text(&input.company_tax_id),
            contact_email: &input.contact_email,
            contact_phone: optional_text(&input.contact_phone),
            region: optional_text(&input.region),
            city: optional_text(&input.city),
            address: optional_text(&input.address),
        },
    )
    .await?;

    info!(application_id = %application.id, applicant_id = %applicant_id, "Venue application submitted");
    Ok(application)
}

pub async fn list(pool: &PgPool, status: ApplicationStatus) -> AppResult<Vec<VenueApplication>> {
    Ok(db::applications::list_by_status(pool, status).await?)
}

pub async fn list_mine(pool: &PgPool, applicant_id: Uuid) -> AppResult<Vec<VenueApplication>> {
    Ok(db::applications::list_for_applicant(pool, applicant_id).await?)
}

fn ensure_pending(application: &VenueApplication) -> AppResult<()> {
    if application.is_pending() {
        return Ok(());
    }
    Err(AppError::Conflict(format!(
        "This application was already {}",
        match application.status {
            ApplicationStatus::Approved => "approved",
            _ => "rejected",
        }
    )))
}

/// Creates the venue, promotes the applicant and closes the application in
/// one transaction.
pub async fn approve(pool: &PgPool, id: Uuid, today: NaiveDate, now: DateTime<Utc>) -> AppResult<Approval> {
    let mut tx = pool.begin().await?;
    let application = db::applications::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    ensure_pending(&application)?;

    let venue = db::venues::insert(
        &mut *tx,
        NewVenue {
            name: &application.venue_name,
            description: application.description.as_deref(),
            address: application.address.as_deref(),
            city: application.city.as_deref(),
            region: application.region.as_deref(),
            phone: application.contact_phone.as_deref(),
            email: Some(&application.contact_email),
        },
        today,
    )
    .await?;

    let admin = db::users::promote_to_venue_admin(&mut *tx, application.applicant_id, venue.id)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("The applicant already has a staff role at a venue".to_string())
        })?;

    let application = db::applications::mark_approved(&mut *tx, id, venue.id, now).await?;
    tx.commit().await?;

    info!(application_id = %id, venue_id = %venue.id, admin_id = %admin.id, "Venue application approved");
    Ok(Approval {
        application,
        venue,
        admin,
    })
}

pub async fn reject(pool: &PgPool, id: Uuid, reason: &str, now: DateTime<Utc>) -> AppResult<VenueApplication> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::ValidationError(
            "A rejection reason is required".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    let application = db::applications::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    ensure_pending(&application)?;

    let application = db::applications::mark_rejected(&mut *tx, id, reason, now)
        .await?
        .ok_or_else(|| AppError::Conflict("This application was already decided".to_string()))?;
    tx.commit().await?;

    info!(application_id = %id, "Venue application rejected");
    Ok(application)
}
