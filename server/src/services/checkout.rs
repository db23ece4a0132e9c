use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{self, purchases::LineDetail, purchases::NewLine};
use crate::domain::availability::Availability;
use crate::models::{EntryType, Purchase, PurchaseStatus};
use crate::utils::{AppError, AppResult};

/// Upper bound on tickets in a single purchase.
pub const MAX_TICKETS_PER_PURCHASE: i64 = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutLine {
    pub entry_type_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub venue_id: Uuid,
    pub visit_date: NaiveDate,
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub lines: Vec<LineDetail>,
    /// Only present for the owner of a paid purchase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_token: Option<String>,
}

#[derive(Debug)]
pub enum CheckoutOutcome {
    Created(PurchaseDetail),
    /// An identical pending purchase was placed moments ago.
    Duplicate(PurchaseDetail),
}

/// Shape checks that need no database: at least one line, positive
/// quantities, no repeated entry type. Returns the total ticket count.
pub fn validate_lines(lines: &[CheckoutLine]) -> AppResult<i32> {
    if lines.is_empty() {
        return Err(AppError::ValidationError(
            "Select at least one entry type".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    let mut total: i64 = 0;
    for line in lines {
        if line.quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if !seen.insert(line.entry_type_id) {
            return Err(AppError::ValidationError(format!(
                "Entry type {} appears more than once",
                line.entry_type_id
            )));
        }
        total += i64::from(line.quantity);
    }

    if total > MAX_TICKETS_PER_PURCHASE {
        return Err(AppError::ValidationError(format!(
            "At most {MAX_TICKETS_PER_PURCHASE} tickets can be bought at once"
        )));
    }
    Ok(total as i32)
}

fn priced_lines(lines: &[CheckoutLine], entry_types: &[EntryType], venue_id: Uuid) -> AppResult<Vec<NewLine>> {
    lines
        .iter()
        .map(|line| {
            let entry_type = entry_types
                .iter()
                .find(|e| e.id == line.entry_type_id)
                .filter(|e| e.venue_id == venue_id)
                .ok_or_else(|| {
                    AppError::NotFound(format!("Entry type {} not found", line.entry_type_id))
                })?;
            if !entry_type.active {
                return Err(AppError::ValidationError(format!(
                    "Entry type '{}' is no longer sold",
                    entry_type.name
                )));
            }
            Ok(NewLine {
                entry_type_id: entry_type.id,
                quantity: line.quantity,
                unit_price: entry_type.price,
            })
        })
        .collect()
}

pub fn total_price(lines: &[NewLine]) -> Decimal {
    lines
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum()
}

/// Places a pending purchase. The venue row lock serialises concurrent
/// checkouts so the daily limit holds.
pub async fn create_purchase(
    pool: &PgPool,
    customer_id: Uuid,
    request: &CheckoutRequest,
    today: NaiveDate,
    duplicate_window: Duration,
    now: DateTime<Utc>,
) -> AppResult<CheckoutOutcome> {
    let quantity = validate_lines(&request.lines)?;
    if request.visit_date < today {
        return Err(AppError::ValidationError(
            "The visit date cannot be in the past".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let venue = db::venues::lock(&mut *tx, request.venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".to_string()))?;
    if !venue.is_active() {
        return Err(AppError::ValidationError(
            "This venue is not taking bookings".to_string(),
        ));
    }

    let ids: Vec<Uuid> = request.lines.iter().map(|l| l.entry_type_id).collect();
    let entry_types = db::entry_types::find_many(&mut *tx, &ids).await?;
    let lines = priced_lines(&request.lines, &entry_types, venue.id)?;

    if let Some(existing) = db::purchases::find_recent_duplicate(
        &mut *tx,
        customer_id,
        venue.id,
        request.visit_date,
        quantity,
        now - duplicate_window,
    )
    .await?
    {
        let lines = db::purchases::line_details(&mut *tx, existing.id).await?;
        tx.commit().await?;
        info!(purchase_id = %existing.id, "Returning recent identical purchase");
        return Ok(CheckoutOutcome::Duplicate(PurchaseDetail {
            purchase: existing,
            lines,
            qr_token: None,
        }));
    }

    let counts = db::purchases::committed_for_venue(&mut *tx, venue.id, request.visit_date).await?;
    let venue_wide = Availability::compute(venue.daily_sales_limit, counts.sold, counts.pending);
    venue_wide.check_quantity(i64::from(quantity))?;

    for line in &lines {
        let capacity = entry_types
            .iter()
            .find(|e| e.id == line.entry_type_id)
            .and_then(|e| e.daily_capacity);
        if capacity.is_none() {
            continue;
        }
        let counts =
            db::purchases::committed_for_entry_type(&mut *tx, line.entry_type_id, request.visit_date)
                .await?;
        Availability::compute(capacity, counts.sold, counts.pending)
            .narrowed_by(venue_wide)
            .check_quantity(i64::from(line.quantity))?;
    }

    let purchase = db::purchases::insert(
        &mut *tx,
        customer_id,
        venue.id,
        request.visit_date,
        quantity,
        total_price(&lines),
    )
    .await?;
    for line in &lines {
        db::purchases::insert_line(&mut *tx, purchase.id, line).await?;
    }
    let details = db::purchases::line_details(&mut *tx, purchase.id).await?;
    tx.commit().await?;

    info!(
        purchase_id = %purchase.id,
        venue_id = %venue.id,
        visit_date = %purchase.visit_date,
        quantity,
        total = %purchase.total,
        "Purchase created"
    );

    Ok(CheckoutOutcome::Created(PurchaseDetail {
        purchase,
        lines: details,
        qr_token: None,
    }))
}

pub async fn cancel_purchase(pool: &PgPool, customer: &AuthUser, id: Uuid) -> AppResult<Purchase> {
    let purchase = db::purchases::find(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase not found".to_string()))?;
    if purchase.customer_id != customer.id {
        return Err(AppError::Forbidden(
            "You can only cancel your own purchases".to_string(),
        ));
    }

    let cancelled = db::purchases::cancel_pending(pool, id).await?.ok_or_else(|| {
        AppError::Conflict(format!(
            "Only pending purchases can be cancelled (status: {})",
            purchase.status.as_str()
        ))
    })?;
    info!(purchase_id = %id, "Purchase cancelled by customer");
    Ok(cancelled)
}

/// Visible to the buyer, staff of the venue and platform admins.
pub async fn get_purchase(pool: &PgPool, caller: &AuthUser, id: Uuid) -> AppResult<PurchaseDetail> {
    let purchase = db::purchases::find(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase not found".to_string()))?;

    let is_owner = purchase.customer_id == caller.id;
    if !is_owner {
        caller.require_venue_staff(purchase.venue_id)?;
    }

    let lines = db::purchases::line_details(pool, id).await?;
    let qr_token = if is_owner && purchase.status == PurchaseStatus::Paid {
        db::tickets::find_by_purchase(pool, id).await?.map(|qr| qr.token)
    } else {
        None
    };

    Ok(PurchaseDetail {
        purchase,
        lines,
        qr_token,
    })
}

/// Expires pending purchases older than `ttl`, freeing their seats.
pub async fn expire_stale_pending(pool: &PgPool, ttl: Duration, now: DateTime<Utc>) -> AppResult<u64> {
    let expired = db::purchases::expire_pending_before(pool, now - ttl).await?;
    if expired > 0 {
        info!(expired, "Expired stale pending purchases");
    }
    Ok(expired)
}
