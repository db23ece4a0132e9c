use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{self, distributions::OverallTotals, distributions::StatusTotals};
use crate::domain::commission;
use crate::models::{DistributionStatus, PaymentDistribution};
use crate::services::payments::commission_percent;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
pub struct DistributionSummary {
    pub by_status: Vec<StatusTotals>,
    pub totals: OverallTotals,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillReport {
    pub created: u32,
    pub skipped: u32,
    pub failed: u32,
}

pub async fn summary(pool: &PgPool) -> AppResult<DistributionSummary> {
    Ok(DistributionSummary {
        by_status: db::distributions::totals_by_status(pool).await?,
        totals: db::distributions::overall_totals(pool).await?,
    })
}

/// Creates the missing distribution for every paid purchase that lacks one.
pub async fn backfill(pool: &PgPool, now: DateTime<Utc>) -> AppResult<BackfillReport> {
    let mut report = BackfillReport::default();

    for purchase in db::purchases::paid_without_distribution(pool).await? {
        let Some(venue) = db::venues::find(pool, purchase.venue_id).await? else {
            warn!(purchase_id = %purchase.id, "Venue missing, distribution not created");
            report.failed += 1;
            continue;
        };
        let gross = purchase.amount_paid.unwrap_or(purchase.total);
        let split = match commission::split(gross, commission_percent(&venue)) {
            Ok(split) => split,
            Err(e) => {
                warn!(purchase_id = %purchase.id, error = %e, "Could not split payment");
                report.failed += 1;
                continue;
            }
        };

        match db::distributions::insert_processed(pool, purchase.id, venue.id, venue.plan_id, &split, now).await? {
            Some(_) => report.created += 1,
            None => report.skipped += 1,
        }
    }

    info!(
        created = report.created,
        skipped = report.skipped,
        failed = report.failed,
        "Distribution backfill finished"
    );
    Ok(report)
}

fn ensure_transition(current: &PaymentDistribution, next: DistributionStatus) -> AppResult<()> {
    if current.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Distribution cannot move from {:?} to {:?}",
            current.status, next
        )))
    }
}

/// Recomputes the split from the venue's current commission. Only allowed
/// before the money has been paid out.
pub async fn recalculate(pool: &PgPool, id: Uuid, now: DateTime<Utc>) -> AppResult<PaymentDistribution> {
    let mut tx = pool.begin().await?;
    let current = db::distributions::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Distribution not found".to_string()))?;
    if !matches!(
        current.status,
        DistributionStatus::Pending | DistributionStatus::Processed
    ) {
        return Err(AppError::Conflict(
            "Only distributions not yet paid out can be recalculated".to_string(),
        ));
    }

    let venue = db::venues::find(&mut *tx, current.venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))?;
    let split = commission::split(current.gross_amount, commission_percent(&venue))?;
    let updated = db::distributions::apply_split(&mut *tx, id, &split, now).await?;
    tx.commit().await?;

    info!(distribution_id = %id, percent = %split.percent, "Distribution recalculated");
    Ok(updated)
}

pub async fn mark_paid_out(
    pool: &PgPool,
    id: Uuid,
    reference: &str,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<PaymentDistribution> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(AppError::ValidationError(
            "A payout reference is required".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    let current = db::distributions::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Distribution not found".to_string()))?;
    ensure_transition(&current, DistributionStatus::PaidOut)?;
    let updated = db::distributions::mark_paid_out(&mut *tx, id, reference, notes, now).await?;
    tx.commit().await?;

    info!(distribution_id = %id, reference, "Distribution paid out");
    Ok(updated)
}

pub async fn mark_failed(pool: &PgPool, id: Uuid, notes: &str) -> AppResult<PaymentDistribution> {
    let notes = notes.trim();
    if notes.is_empty() {
        return Err(AppError::ValidationError(
            "Describe why the distribution failed".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;
    let current = db::distributions::lock(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Distribution not found".to_string()))?;
    ensure_transition(&current, DistributionStatus::Failed)?;
    let updated = db::distributions::mark_failed(&mut *tx, id, notes).await?;
    tx.commit().await?;

    warn!(distribution_id = %id, notes, "Distribution marked failed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn distribution(status: DistributionStatus) -> PaymentDistribution {
        PaymentDistribution {
            id: Uuid::new_v4(),
            purchase_id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            plan_id: None,
            gross_amount: Decimal::new(10000, 2),
            commission_percent: Decimal::new(5, 0),
            commission_amount: Decimal::new(500, 2),
            venue_amount: Decimal::new(9500, 2),
            status,
            payout_reference: None,
            notes: None,
            calculated_at: Utc::now(),
            processed_at: None,
            paid_out_at: None,
        }
    }

    #[test]
    fn test_payout_requires_processed() {
        assert!(ensure_transition(&distribution(DistributionStatus::Processed), DistributionStatus::PaidOut).is_ok());
        assert!(matches!(
            ensure_transition(&distribution(DistributionStatus::Pending), DistributionStatus::PaidOut),
            Err(AppError::Conflict(_))
        ));
        assert!(ensure_transition(&distribution(DistributionStatus::PaidOut), DistributionStatus::Failed).is_err());
    }
}
