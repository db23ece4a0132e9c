use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::utils::AppError;

/// Commission applied when a venue has never been assigned a plan.
pub const DEFAULT_COMMISSION_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Split {
    pub gross: Decimal,
    pub percent: Decimal,
    pub commission: Decimal,
    pub venue_amount: Decimal,
}

/// Splits a gross payment into platform commission and venue payout.
///
/// The commission is rounded to cents (half away from zero) and the venue
/// receives the exact remainder, so the two parts always add up to `gross`.
pub fn split(gross: Decimal, percent: Decimal) -> Result<Split, AppError> {
    if gross.is_sign_negative() {
        return Err(AppError::ValidationError(
            "Payment amount cannot be negative".to_string(),
        ));
    }
    if percent.is_sign_negative() || percent > Decimal::ONE_HUNDRED {
        return Err(AppError::ValidationError(format!(
            "Commission percent {percent} is outside 0..=100"
        )));
    }

    let commission = (gross * percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Ok(Split {
        gross,
        percent,
        commission,
        venue_amount: gross - commission,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    #[test]
    fn test_basic_plan_split() {
        let s = split(d(25_000, 0), d(5, 0)).unwrap();
        assert_eq!(s.commission, d(1250, 0));
        assert_eq!(s.venue_amount, d(23_750, 0));
    }

    #[test]
    fn test_fractional_percent_rounds_half_away() {
        // 7.5% of 10.10 = 0.7575 -> 0.76
        let s = split(d(1010, 2), d(75, 1)).unwrap();
        assert_eq!(s.commission, d(76, 2));
        assert_eq!(s.venue_amount, d(934, 2));
    }

    #[test]
    fn test_default_percent_is_five() {
        assert_eq!(DEFAULT_COMMISSION_PERCENT, d(5, 0));
    }

    #[test]
    fn test_rejects_out_of_range_percent() {
        assert!(split(d(100, 0), d(101, 0)).is_err());
        assert!(split(d(100, 0), d(-1, 0)).is_err());
        assert!(split(d(-100, 0), d(5, 0)).is_err());
    }

    proptest! {
        #[test]
        fn parts_add_up(cents in 0i64..100_000_000, pct_tenths in 0i64..=1000) {
            let gross = d(cents, 2);
            let pct = d(pct_tenths, 1);
            let s = split(gross, pct).unwrap();
            prop_assert_eq!(s.commission + s.venue_amount, gross);
            prop_assert!(s.commission >= Decimal::ZERO);
            prop_assert!(s.commission <= gross);
        }
    }
}
