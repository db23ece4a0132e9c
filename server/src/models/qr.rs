use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QrCode {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub token: String,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScanLog {
    pub id: Uuid,
    pub qr_code_id: Uuid,
    pub scanned_by: Option<Uuid>,
    pub success: bool,
    pub message: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub scanned_at: DateTime<Utc>,
}
