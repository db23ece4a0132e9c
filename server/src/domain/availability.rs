//! Daily inventory arithmetic.
//!
//! A venue sells at most `daily_sales_limit` tickets per visit date. Seats are
//! held by pending and paid purchases; cancelled and expired purchases release
//! them. Entry types may carry their own daily capacity, which applies on top
//! of the venue-wide limit.

use serde::Serialize;

use crate::utils::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    /// `None` when the venue has no daily limit.
    pub limit: Option<i64>,
    pub sold: i64,
    pub pending: i64,
    pub committed: i64,
    /// `None` when unlimited.
    pub remaining: Option<i64>,
    pub can_sell: bool,
    pub unlimited: bool,
}

impl Availability {
    pub fn compute(limit: Option<i32>, sold: i64, pending: i64) -> Self {
        let committed = sold + pending;
        match limit.filter(|l| *l > 0) {
            Some(limit) => {
                let limit = i64::from(limit);
                let remaining = (limit - committed).max(0);
                Self {
                    limit: Some(limit),
                    sold,
                    pending,
                    committed,
                    remaining: Some(remaining),
                    can_sell: remaining > 0,
                    unlimited: false,
                }
            }
            None => Self {
                limit: None,
                sold,
                pending,
                committed,
                remaining: None,
                can_sell: true,
                unlimited: true,
            },
        }
    }

    /// Combines a venue-wide figure with an entry-type figure; the tighter
    /// limit wins.
    pub fn narrowed_by(self, other: Availability) -> Availability {
        match (self.remaining, other.remaining) {
            (_, None) => self,
            (None, Some(_)) => other,
            (Some(a), Some(b)) if b < a => other,
            _ => self,
        }
    }

    pub fn allows(&self, quantity: i64) -> bool {
        match self.remaining {
            None => true,
            Some(remaining) => quantity <= remaining,
        }
    }

    /// Checks a requested quantity and reports how many seats are left when it
    /// does not fit.
    pub fn check_quantity(&self, quantity: i64) -> Result<(), AppError> {
        if quantity < 1 {
            return Err(AppError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if self.allows(quantity) {
            return Ok(());
        }
        let remaining = self.remaining.unwrap_or(0);
        Err(AppError::SoldOut {
            remaining,
            message: format!("Only {remaining} ticket(s) left for the selected date"),
        })
    }
}

/// Maximum number of days the "next available dates" search will scan.
pub const MAX_DATE_SCAN_DAYS: i64 = 90;

pub fn clamp_scan_days(requested: Option<i64>) -> i64 {
    requested.unwrap_or(30).clamp(1, MAX_DATE_SCAN_DAYS)
}
