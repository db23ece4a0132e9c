use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "distribution_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Pending,
    Processed,
    PaidOut,
    Failed,
}

impl DistributionStatus {
    pub fn can_transition_to(self, next: DistributionStatus) -> bool {
        use DistributionStatus::*;
        matches!(
            (self, next),
            (Pending, Processed) | (Pending, Failed) | (Processed, PaidOut) | (Processed, Failed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentDistribution {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub venue_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub gross_amount: Decimal,
    pub commission_percent: Decimal,
    pub commission_amount: Decimal,
    pub venue_amount: Decimal,
    pub status: DistributionStatus,
    pub payout_reference: Option<String>,
    pub notes: Option<String>,
    pub calculated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub paid_out_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::DistributionStatus::*;

    #[test]
    fn test_distribution_lifecycle() {
        assert!(Pending.can_transition_to(Processed));
        assert!(Processed.can_transition_to(PaidOut));
        assert!(Processed.can_transition_to(Failed));
    }

    #[test]
    fn test_terminal_states_do_not_move() {
        assert!(!PaidOut.can_transition_to(Processed));
        assert!(!Failed.can_transition_to(Processed));
        assert!(!Pending.can_transition_to(PaidOut));
    }
}
