//! Gate-side ticket validation rules.
//!
//! The handler loads the ticket state and calls [`evaluate`]. The decision is
//! then committed with a conditional update, so a concurrent scan of the same
//! code still fails with [`Rejection::AlreadyUsed`].

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::PurchaseStatus;

#[derive(Debug, Clone)]
pub struct TicketSnapshot {
    pub venue_id: Uuid,
    pub visit_date: NaiveDate,
    pub purchase_status: PurchaseStatus,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    /// Whether the presented token is the one currently stored for the QR row.
    pub token_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidToken,
    NotFound,
    WrongVenue { ticket_venue: Uuid },
    AlreadyUsed { used_at: Option<DateTime<Utc>> },
    NotPaid { status: PurchaseStatus },
    TooEarly { visit_date: NaiveDate },
    Expired { visit_date: NaiveDate },
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::InvalidToken => "invalid_token",
            Rejection::NotFound => "not_found",
            Rejection::WrongVenue { .. } => "wrong_venue",
            Rejection::AlreadyUsed { .. } => "already_used",
            Rejection::NotPaid { .. } => "not_paid",
            Rejection::TooEarly { .. } => "too_early",
            Rejection::Expired { .. } => "expired",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Rejection::InvalidToken => "The QR code is invalid or has been replaced".to_string(),
            Rejection::NotFound => "No ticket matches this QR code".to_string(),
            Rejection::WrongVenue { .. } => "This ticket belongs to another venue".to_string(),
            Rejection::AlreadyUsed { used_at: Some(at) } => {
                format!("This ticket was already used on {}", at.format("%d/%m/%Y %H:%M"))
            }
            Rejection::AlreadyUsed { used_at: None } => "This ticket was already used".to_string(),
            Rejection::NotPaid { status } => {
                format!("This ticket has not been paid (status: {})", status.as_str())
            }
            Rejection::TooEarly { visit_date } => format!(
                "This ticket is for {} and cannot be used before that date",
                visit_date.format("%d/%m/%Y")
            ),
            Rejection::Expired { visit_date } => {
                format!("This ticket expired on {}", visit_date.format("%d/%m/%Y"))
            }
        }
    }

    pub fn details(&self) -> Value {
        match self {
            Rejection::WrongVenue { ticket_venue } => {
                json!({ "reason": self.reason(), "ticket_venue_id": ticket_venue })
            }
            Rejection::AlreadyUsed { used_at } => {
                json!({ "reason": self.reason(), "used_at": used_at })
            }
            Rejection::TooEarly { visit_date } | Rejection::Expired { visit_date } => {
                json!({ "reason": self.reason(), "visit_date": visit_date })
            }
            _ => json!({ "reason": self.reason() }),
        }
    }
}

/// Applies the gate checks in order; the first failing check wins.
pub fn evaluate(
    ticket: &TicketSnapshot,
    worker_venue: Uuid,
    today: NaiveDate,
) -> Result<(), Rejection> {
    if !ticket.token_current {
        return Err(Rejection::InvalidToken);
    }
    if ticket.venue_id != worker_venue {
        return Err(Rejection::WrongVenue {
            ticket_venue: ticket.venue_id,
        });
    }
    if ticket.used {
        return Err(Rejection::AlreadyUsed {
            used_at: ticket.used_at,
        });
    }
    if ticket.purchase_status != PurchaseStatus::Paid {
        return Err(Rejection::NotPaid {
            status: ticket.purchase_status,
        });
    }
    if today < ticket.visit_date {
        return Err(Rejection::TooEarly {
            visit_date: ticket.visit_date,
        });
    }
    if today > ticket.visit_date {
        return Err(Rejection::Expired {
            visit_date: ticket.visit_date,
        });
    }
    Ok(())
}
