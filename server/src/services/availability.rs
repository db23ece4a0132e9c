use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db::{self, purchases::DailyCounts};
use crate::domain::availability::Availability;
use crate::models::{EntryType, Venue};
use crate::utils::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct DateAvailability {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub availability: Availability,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueAvailability {
    pub venue_id: Uuid,
    pub venue_name: String,
    pub city: Option<String>,
    pub featured: bool,
    #[serde(flatten)]
    pub availability: Availability,
}

pub async fn for_venue(ex: impl PgExecutor<'_>, venue: &Venue, date: NaiveDate) -> AppResult<Availability> {
    let counts = db::purchases::committed_for_venue(ex, venue.id, date).await?;
    Ok(Availability::compute(
        venue.daily_sales_limit,
        counts.sold,
        counts.pending,
    ))
}

/// Availability of one entry type: its own daily capacity, if any, narrowed
/// by the venue-wide figure.
pub async fn for_entry_type(
    pool: &PgPool,
    venue: &Venue,
    entry_type: &EntryType,
    date: NaiveDate,
) -> AppResult<Availability> {
    let venue_wide = for_venue(pool, venue, date).await?;
    let counts = db::purchases::committed_for_entry_type(pool, entry_type.id, date).await?;
    let own = Availability::compute(entry_type.daily_capacity, counts.sold, counts.pending);
    Ok(venue_wide.narrowed_by(own))
}

/// Dates in `[from, from + days)` on which the venue can still sell.
pub async fn available_dates(
    pool: &PgPool,
    venue: &Venue,
    from: NaiveDate,
    days: i64,
) -> AppResult<Vec<DateAvailability>> {
    let last = from
        .checked_add_days(Days::new(days.saturating_sub(1).max(0) as u64))
        .unwrap_or(from);
    let counts = db::purchases::committed_by_date(pool, venue.id, from, last).await?;
    Ok(open_dates(venue.daily_sales_limit, from, last, &counts))
}

fn open_dates(
    limit: Option<i32>,
    from: NaiveDate,
    last: NaiveDate,
    counts: &[DailyCounts],
) -> Vec<DateAvailability> {
    let by_date: HashMap<NaiveDate, &DailyCounts> =
        counts.iter().map(|c| (c.visit_date, c)).collect();

    from.iter_days()
        .take_while(|date| *date <= last)
        .map(|date| {
            let (sold, pending) = by_date
                .get(&date)
                .map(|c| (c.sold, c.pending))
                .unwrap_or((0, 0));
            DateAvailability {
                date,
                availability: Availability::compute(limit, sold, pending),
            }
        })
        .filter(|d| d.availability.can_sell)
        .collect()
}

/// Active venues that can still sell on `date`.
pub async fn venues_open_on(
    pool: &PgPool,
    date: NaiveDate,
    exclude_unlimited: bool,
) -> AppResult<Vec<VenueAvailability>> {
    let listings = db::venues::list_active(pool).await?;
    let mut open = Vec::with_capacity(listings.len());

    for listing in listings {
        let availability = for_venue(pool, &listing.venue, date).await?;
        if !availability.can_sell || (exclude_unlimited && availability.unlimited) {
            continue;
        }
        open.push(VenueAvailability {
            venue_id: listing.venue.id,
            venue_name: listing.venue.name,
            city: listing.venue.city,
            featured: listing.featured,
            availability,
        });
    }
    Ok(open)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_open_dates_skips_full_days() {
        let counts = vec![
            DailyCounts { visit_date: date(2), sold: 8, pending: 2 },
            DailyCounts { visit_date: date(3), sold: 5, pending: 0 },
        ];
        let open = open_dates(Some(10), date(1), date(4), &counts);
        let days: Vec<_> = open.iter().map(|d| d.date).collect();
        assert_eq!(days, vec![date(1), date(3), date(4)]);
        assert_eq!(open[1].availability.remaining, Some(5));
    }

    #[test]
    fn test_open_dates_unlimited_venue() {
        let open = open_dates(None, date(1), date(3), &[]);
        assert_eq!(open.len(), 3);
        assert!(open.iter().all(|d| d.availability.unlimited));
    }
}
