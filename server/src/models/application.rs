use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

/// A request from a customer to list their venue on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VenueApplication {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub venue_name: String,
    pub description: Option<String>,
    pub company_tax_id: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub venue_id: Option<Uuid>,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl VenueApplication {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}
