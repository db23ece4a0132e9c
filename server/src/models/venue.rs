use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Photo limit value meaning "no limit".
pub const UNLIMITED_PHOTOS: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub subscription_state: SubscriptionState,
    pub subscribed_on: Option<NaiveDate>,
    pub plan_id: Option<Uuid>,
    pub commission_percent: Decimal,
    pub photo_limit: i32,
    pub daily_sales_limit: Option<i32>,
    #[serde(skip_serializing)]
    pub payment_account_id: Option<String>,
    pub rating_average: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    pub fn is_active(&self) -> bool {
        self.subscription_state == SubscriptionState::Active
    }

    /// Whether one more photo fits under the plan's photo limit.
    pub fn can_add_photo(&self, current_photos: i64) -> bool {
        self.photo_limit == UNLIMITED_PHOTOS || current_photos < i64::from(self.photo_limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub commission_percent: Decimal,
    pub photo_limit: i32,
    pub featured: bool,
    pub advanced_dashboard: bool,
    pub priority_support: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VenuePhoto {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue_with_photo_limit(limit: i32) -> Venue {
        Venue {
            id: Uuid::new_v4(),
            name: "Termas del Sol".to_string(),
            description: None,
            address: None,
            city: None,
            region: None,
            phone: None,
            email: None,
            subscription_state: SubscriptionState::Active,
            subscribed_on: None,
            plan_id: None,
            commission_percent: Decimal::new(5, 0),
            photo_limit: limit,
            daily_sales_limit: None,
            payment_account_id: None,
            rating_average: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_photo_limit_is_enforced() {
        let venue = venue_with_photo_limit(5);
        assert!(venue.can_add_photo(4));
        assert!(!venue.can_add_photo(5));
        assert!(!venue.can_add_photo(9));
    }

    #[test]
    fn test_unlimited_photos() {
        let venue = venue_with_photo_limit(UNLIMITED_PHOTOS);
        assert!(venue.can_add_photo(10_000));
    }
}
