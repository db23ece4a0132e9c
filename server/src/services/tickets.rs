use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::extractor::ClientMeta;
use crate::db::{self, purchases::LineDetail, purchases::TicketSearchRow, tickets::NewScanLog, tickets::RecentScan};
use crate::domain::qr_token::QrCipher;
use crate::domain::validation::{evaluate, Rejection, TicketSnapshot};
use crate::models::QrCode;
use crate::utils::time::{first_of_month, local_date, local_day_start};
use crate::utils::{AppError, AppResult};

const RECENT_SCANS: i64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct AdmittedTicket {
    pub purchase_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub venue_id: Uuid,
    pub venue_name: String,
    pub visit_date: NaiveDate,
    pub quantity: i32,
    pub used_at: Option<DateTime<Utc>>,
    pub lines: Vec<LineDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub scanned_today: i64,
    pub scanned_this_month: i64,
    pub failed_today: i64,
    pub recent: Vec<RecentScan>,
}

pub struct Gate<'a> {
    pub pool: &'a PgPool,
    pub cipher: &'a QrCipher,
    pub offset: FixedOffset,
}

impl Gate<'_> {
    /// Validates a scanned code for the worker's venue and consumes it.
    pub async fn admit(
        &self,
        worker_id: Uuid,
        worker_venue: Uuid,
        token: &str,
        meta: &ClientMeta,
        now: DateTime<Utc>,
    ) -> AppResult<AdmittedTicket> {
        let token = token.trim();
        let claims = self
            .cipher
            .open(token)
            .map_err(|_| AppError::TicketRejected(Rejection::InvalidToken))?;

        let qr = db::tickets::find_by_purchase(self.pool, claims.purchase_id)
            .await?
            .ok_or(AppError::TicketRejected(Rejection::NotFound))?;
        let purchase = match db::purchases::find(self.pool, qr.purchase_id).await? {
            Some(purchase) => purchase,
            None => return Err(self.reject(&qr, worker_id, Rejection::NotFound, meta).await),
        };

        let snapshot = TicketSnapshot {
            venue_id: purchase.venue_id,
            visit_date: purchase.visit_date,
            purchase_status: purchase.status,
            used: qr.used,
            used_at: qr.used_at,
            token_current: qr.token == token,
        };
        if let Err(rejection) = evaluate(&snapshot, worker_venue, local_date(now, self.offset)) {
            return Err(self.reject(&qr, worker_id, rejection, meta).await);
        }

        let mut tx = self.pool.begin().await?;
        let consumed = match db::tickets::consume(&mut *tx, qr.id, now).await? {
            Some(consumed) => consumed,
            None => {
                tx.rollback().await?;
                let used_at = db::tickets::find_by_purchase(self.pool, purchase.id)
                    .await?
                    .and_then(|q| q.used_at);
                let rejection = Rejection::AlreadyUsed { used_at };
                return Err(self.reject(&qr, worker_id, rejection, meta).await);
            }
        };
        let ip = meta.ip_string();
        db::tickets::insert_scan_log(
            &mut *tx,
            NewScanLog {
                qr_code_id: qr.id,
                scanned_by: worker_id,
                success: true,
                message: "Ticket admitted",
                ip_address: ip.as_deref(),
                user_agent: meta.user_agent.as_deref(),
            },
        )
        .await?;
        tx.commit().await?;

        info!(purchase_id = %purchase.id, worker_id = %worker_id, "Ticket admitted");

        let customer = db::users::find(self.pool, purchase.customer_id).await?;
        let venue = db::venues::find(self.pool, purchase.venue_id).await?;
        let lines = db::purchases::line_details(self.pool, purchase.id).await?;

        Ok(AdmittedTicket {
            purchase_id: purchase.id,
            customer_name: customer.as_ref().map(|c| c.full_name()).unwrap_or_default(),
            customer_email: customer.map(|c| c.email).unwrap_or_default(),
            venue_id: purchase.venue_id,
            venue_name: venue.map(|v| v.name).unwrap_or_default(),
            visit_date: purchase.visit_date,
            quantity: purchase.quantity,
            used_at: consumed.used_at,
            lines,
        })
    }

    /// Records a failed scan and turns the rejection into the response error.
    /// A failure to write the log does not change the outcome.
    async fn reject(&self, qr: &QrCode, worker_id: Uuid, rejection: Rejection, meta: &ClientMeta) -> AppError {
        let message = rejection.message();
        let ip = meta.ip_string();
        let log = NewScanLog {
            qr_code_id: qr.id,
            scanned_by: worker_id,
            success: false,
            message: &message,
            ip_address: ip.as_deref(),
            user_agent: meta.user_agent.as_deref(),
        };
        if let Err(e) = db::tickets::insert_scan_log(self.pool, log).await {
            warn!(qr_code_id = %qr.id, error = %e, "Could not record failed scan");
        }
        AppError::TicketRejected(rejection)
    }
}

pub fn normalise_search(raw: &str) -> AppResult<&str> {
    let query = raw.trim();
    if query.chars().count() < 2 {
        return Err(AppError::ValidationError(
            "Search needs at least 2 characters".to_string(),
        ));
    }
    Ok(query)
}

pub async fn search(pool: &PgPool, venue_id: Uuid, raw: &str) -> AppResult<Vec<TicketSearchRow>> {
    let query = normalise_search(raw)?;
    Ok(db::purchases::search_paid_for_venue(pool, venue_id, query).await?)
}

pub async fn scan_stats(
    pool: &PgPool,
    venue_id: Uuid,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> AppResult<ScanStats> {
    let today = local_date(now, offset);
    let day_start = local_day_start(today, offset);
    let day_end = day_start + chrono::Duration::days(1);
    let month_start = local_day_start(first_of_month(today), offset);

    let counts = db::tickets::scan_counts(pool, venue_id, day_start, day_end, month_start).await?;
    let recent = db::tickets::recent_scans(pool, venue_id, RECENT_SCANS).await?;

    Ok(ScanStats {
        scanned_today: counts.scanned_today,
        scanned_this_month: counts.scanned_this_month,
        failed_today: counts.failed_today,
        recent,
    })
}
