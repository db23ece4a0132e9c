//! Payment gateway notifications and the revenue split they trigger.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db;
use crate::domain::commission::{self, DEFAULT_COMMISSION_PERCENT};
use crate::domain::qr_token::TicketClaims;
use crate::models::{PurchaseStatus, Venue};
use crate::notifications::messages;
use crate::state::AppState;
use crate::utils::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Rejected,
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub payment_id: String,
    pub purchase_id: Uuid,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub payer_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Confirmed,
    AlreadyPaid,
    Cancelled,
    /// Money arrived for a purchase that no longer holds seats.
    RefundRequired,
    Ignored,
}

/// Checks `X-Signature: sha256=<hex>` against the raw request body.
pub fn verify_signature(secret: &[u8], body: &[u8], header: Option<&str>) -> AppResult<()> {
    let invalid = || AppError::AuthError("Invalid webhook signature".to_string());

    let hex_sig = header
        .and_then(|h| h.trim().strip_prefix("sha256="))
        .ok_or_else(invalid)?;
    let signature = hex::decode(hex_sig).map_err(|_| invalid())?;

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::InternalServerError(format!("invalid webhook key: {e}")))?;
    mac.update(body);
    mac.verify_slice(&signature).map_err(|_| invalid())
}

/// Venues without a plan pay the base commission.
pub fn commission_percent(venue: &Venue) -> Decimal {
    if venue.plan_id.is_some() {
        venue.commission_percent
    } else {
        DEFAULT_COMMISSION_PERCENT
    }
}

pub async fn handle_notification(
    state: &AppState,
    notification: &PaymentNotification,
    now: DateTime<Utc>,
) -> AppResult<WebhookOutcome> {
    info!(
        payment_id = %notification.payment_id,
        purchase_id = %notification.purchase_id,
        status = ?notification.status,
        "Payment notification received"
    );

    match notification.status {
        PaymentStatus::Approved => confirm_payment(state, notification, now).await,
        PaymentStatus::Rejected | PaymentStatus::Cancelled => {
            match db::purchases::cancel_pending(&state.pool, notification.purchase_id).await? {
                Some(_) => {
                    info!(purchase_id = %notification.purchase_id, "Purchase cancelled after failed payment");
                    Ok(WebhookOutcome::Cancelled)
                }
                None => Ok(WebhookOutcome::Ignored),
            }
        }
        PaymentStatus::Pending => Ok(WebhookOutcome::Ignored),
    }
}

async fn confirm_payment(
    state: &AppState,
    notification: &PaymentNotification,
    now: DateTime<Utc>,
) -> AppResult<WebhookOutcome> {
    let mut tx = state.pool.begin().await?;

    let purchase = db::purchases::lock(&mut *tx, notification.purchase_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase not found".to_string()))?;

    if purchase.status == PurchaseStatus::Paid {
        info!(purchase_id = %purchase.id, "Payment already applied");
        return Ok(WebhookOutcome::AlreadyPaid);
    }
    if !purchase.status.holds_inventory() {
        error!(
            purchase_id = %purchase.id,
            payment_id = %notification.payment_id,
            status = purchase.status.as_str(),
            amount = %notification.amount,
            "Payment approved for a purchase that no longer holds seats; refund required"
        );
        return Ok(WebhookOutcome::RefundRequired);
    }

    if notification.amount != purchase.total {
        return Err(AppError::ValidationError(format!(
            "Paid amount {} does not match purchase total {}",
            notification.amount, purchase.total
        )));
    }

    let paid = db::purchases::mark_paid(
        &mut *tx,
        purchase.id,
        &notification.payment_id,
        notification.payer_email.as_deref(),
        notification.amount,
        now,
    )
    .await?;

    let venue = db::venues::find(&mut *tx, paid.venue_id)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Purchase venue is missing".to_string()))?;

    let claims = TicketClaims {
        purchase_id: paid.id,
        venue_id: paid.venue_id,
        visit_date: paid.visit_date,
        quantity: paid.quantity,
        issued_at: now,
    };
    let token = state
        .qr
        .seal(&claims)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    db::tickets::insert_qr(&mut *tx, paid.id, &token).await?;

    let split = commission::split(notification.amount, commission_percent(&venue))?;
    db::distributions::insert_processed(&mut *tx, paid.id, venue.id, venue.plan_id, &split, now).await?;

    tx.commit().await?;
    info!(
        purchase_id = %paid.id,
        commission = %split.commission,
        venue_amount = %split.venue_amount,
        "Payment confirmed"
    );

    match db::users::find(&state.pool, paid.customer_id).await {
        Ok(Some(customer)) => {
            let email = messages::booking_confirmation(&paid, &venue, &customer, &token);
            if let Err(e) = state.mailer.send(email).await {
                warn!(purchase_id = %paid.id, error = %e, "Could not send booking confirmation");
            }
        }
        Ok(None) => warn!(purchase_id = %paid.id, "Customer missing, confirmation not sent"),
        Err(e) => warn!(purchase_id = %paid.id, error = %e, "Could not load customer for confirmation"),
    }

    Ok(WebhookOutcome::Confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &[u8], body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_signature_accepts_valid_mac() {
        let body = br#"{"payment_id":"1"}"#;
        let header = sign(b"webhook-secret-123", body);
        assert!(verify_signature(b"webhook-secret-123", body, Some(&header)).is_ok());
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let body = br#"{"amount":"100.00"}"#;
        let header = sign(b"webhook-secret-123", body);

        let tampered = br#"{"amount":"1.00"}"#;
        assert!(verify_signature(b"webhook-secret-123", tampered, Some(&header)).is_err());
        assert!(verify_signature(b"other-secret-value", body, Some(&header)).is_err());
        assert!(verify_signature(b"webhook-secret-123", body, None).is_err());
        assert!(verify_signature(b"webhook-secret-123", body, Some("sha256=zz")).is_err());
        assert!(verify_signature(b"webhook-secret-123", body, Some("md5=00")).is_err());
    }

    #[test]
    fn test_notification_parses_gateway_status() {
        let raw = r#"{
            "payment_id": "mp-991",
            "purchase_id": "6f1b7a52-2c1e-4d0b-9a55-0c3f3c1b0001",
            "status": "approved",
            "amount": "24000.00",
            "payer_email": null
        }"#;
        let parsed: PaymentNotification = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, PaymentStatus::Approved);
        assert_eq!(parsed.amount, Decimal::new(2400000, 2));
    }
}
