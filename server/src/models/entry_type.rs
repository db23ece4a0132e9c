use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "duration_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    Day,
    HalfDay,
    Night,
    FullDay,
}

impl DurationKind {
    pub fn default_hours(self) -> i32 {
        match self {
            DurationKind::Day => 12,
            DurationKind::HalfDay => 6,
            DurationKind::Night => 12,
            DurationKind::FullDay => 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntryType {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_kind: DurationKind,
    pub duration_hours: Option<i32>,
    pub daily_capacity: Option<i32>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
