//! Seller and admin dashboard views built on top of [`crate::stats`].

use std::collections::HashSet;

use chrono::{DateTime, Datelike, TimeZone};
use serde::Serialize;

use crate::products::Product;
use crate::stats::{category_breakdown, summarize, CategoryCount, StatsSummary};

/// Number of trailing calendar months shown in the activity chart.
pub const MONTHS_SHOWN: u32 = 6;
/// Number of listings shown under "recent listings".
pub const RECENT_SHOWN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellerDashboard {
    pub summary: StatsSummary,
    pub categories: Vec<CategoryCount>,
    /// Oldest month first, ending with the current month.
    pub monthly: Vec<MonthCount>,
    /// The first listings of the input, which the repository supplies newest first.
    pub recent: Vec<Product>,
}

impl SellerDashboard {
    #[must_use]
    pub fn build<Tz: TimeZone>(products: &[Product], now: &DateTime<Tz>) -> Self {
        Self {
            summary: summarize(products, now),
            categories: category_breakdown(products),
            monthly: monthly_counts(products, now, MONTHS_SHOWN),
            recent: products.iter().take(RECENT_SHOWN).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketplaceStats {
    pub summary: StatsSummary,
    /// Distinct owners with at least one listing.
    pub seller_count: usize,
    pub categories: Vec<CategoryCount>,
}

impl MarketplaceStats {
    #[must_use]
    pub fn build<Tz: TimeZone>(products: &[Product], now: &DateTime<Tz>) -> Self {
        let seller_count = products
            .iter()
            .map(|p| p.owner_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        Self {
            summary: summarize(products, now),
            seller_count,
            categories: category_breakdown(products),
        }
    }
}

/// Listing counts for the `months` calendar months ending with `now`'s month.
#[must_use]
pub fn monthly_counts<Tz: TimeZone>(
    products: &[Product],
    now: &DateTime<Tz>,
    months: u32,
) -> Vec<MonthCount> {
    let tz = now.timezone();
    let mut buckets: Vec<MonthCount> = (0..months)
        .rev()
        .map(|back| {
            let (year, month) = months_before(now.year(), now.month(), back);
            MonthCount {
                year,
                month,
                count: 0,
            }
        })
        .collect();

    for product in products {
        let created = product.created_at.with_timezone(&tz);
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|b| b.year == created.year() && b.month == created.month())
        {
            bucket.count += 1;
        }
    }

    buckets
}

fn months_before(year: i32, month: u32, back: u32) -> (i32, u32) {
    // months since year 0, zero-based
    let index = i64::from(year) * 12 + i64::from(month) - 1 - i64::from(back);
    let y = index.div_euclid(12);
    let m = index.rem_euclid(12) + 1;
    (
        i32::try_from(y).unwrap_or(year),
        u32::try_from(m).unwrap_or(month),
    )
}
