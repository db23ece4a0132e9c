use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purchase_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Paid,
    Cancelled,
    Expired,
}

impl PurchaseStatus {
    /// Whether tickets in this state hold seats against the daily limit.
    pub fn holds_inventory(self) -> bool {
        matches!(self, PurchaseStatus::Pending | PurchaseStatus::Paid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Paid => "paid",
            PurchaseStatus::Cancelled => "cancelled",
            PurchaseStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub venue_id: Uuid,
    pub visit_date: NaiveDate,
    pub quantity: i32,
    pub total: Decimal,
    pub status: PurchaseStatus,
    pub payment_id: Option<String>,
    pub payer_email: Option<String>,
    pub amount_paid: Option<Decimal>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseLine {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub entry_type_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}
