//! Seller statistics derived from an already-fetched product list.
//!
//! Everything here is a pure function of its inputs: the product slice and,
//! for month bucketing, the instant treated as "now". Callers recompute on
//! every fetch; nothing is cached between calls.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Local, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::products::Product;

/// Placeholder shown for `top_category` when there are no listings.
pub const NO_CATEGORY: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub total_listed: usize,
    pub total_value: Decimal,
    /// `total_value / total_listed` rounded half away from zero to a whole unit.
    pub average_price: Decimal,
    pub top_category: String,
    pub listed_this_month: usize,
}

/// Occurrences and summed value of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
    pub total_value: Decimal,
}

/// Summarizes `products` as of `now`.
///
/// `listed_this_month` compares calendar month and year in `now`'s timezone.
#[must_use]
pub fn summarize<Tz: TimeZone>(products: &[Product], now: &DateTime<Tz>) -> StatsSummary {
    let total_listed = products.len();
    let total_value = products
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.price_or_zero()));

    let average_price = if total_listed == 0 {
        Decimal::ZERO
    } else {
        (total_value / Decimal::from(total_listed))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    };

    let top_category = top_category(&category_breakdown(products));

    let listed_this_month = products
        .iter()
        .filter(|p| same_month(&p.created_at.with_timezone(&now.timezone()), now))
        .count();

    StatsSummary {
        total_listed,
        total_value,
        average_price,
        top_category,
        listed_this_month,
    }
}

/// [`summarize`] against the local system clock.
#[must_use]
pub fn summarize_now(products: &[Product]) -> StatsSummary {
    summarize(products, &Local::now())
}

/// Per-category counts in first-encountered order.
#[must_use]
pub fn category_breakdown(products: &[Product]) -> Vec<CategoryCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for product in products {
        let slot = *index.entry(product.category.as_str()).or_insert_with(|| {
            counts.push(CategoryCount {
                category: product.category.clone(),
                count: 0,
                total_value: Decimal::ZERO,
            });
            counts.len() - 1
        });
        counts[slot].count += 1;
        counts[slot].total_value = counts[slot]
            .total_value
            .saturating_add(product.price_or_zero());
    }

    counts
}

/// Highest count wins; on a tie the earlier entry is kept.
fn top_category(counts: &[CategoryCount]) -> String {
    let mut best: Option<&CategoryCount> = None;
    for entry in counts {
        if best.is_none_or(|b| entry.count > b.count) {
            best = Some(entry);
        }
    }
    best.map_or_else(|| NO_CATEGORY.to_string(), |b| b.category.clone())
}

pub(crate) fn same_month<A: TimeZone, B: TimeZone>(a: &DateTime<A>, b: &DateTime<B>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

#[cfg(test)]
#[path = "stats_test.rs"]
mod tests;
