use chrono::{FixedOffset, Utc};
use serde_json::json;

use super::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
}

fn product(id: &str, price: serde_json::Value, category: &str, created_at: &str) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("item {id}"),
        "price": price,
        "category": category,
        "created_at": created_at,
        "owner_id": "seller-1"
    }))
    .expect("valid product row")
}

fn priced(prices: &[i64]) -> Vec<Product> {
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| product(&i.to_string(), json!(p), "misc", "2024-01-10T08:00:00Z"))
        .collect()
}

#[test]
fn empty_input_yields_zeroed_summary() {
    let summary = summarize(&[], &now());
    assert_eq!(
        summary,
        StatsSummary {
            total_listed: 0,
            total_value: Decimal::ZERO,
            average_price: Decimal::ZERO,
            top_category: "-".to_string(),
            listed_this_month: 0,
        }
    );
}

#[test]
fn sums_and_averages_prices() {
    let summary = summarize(&priced(&[100, 200, 300]), &now());
    assert_eq!(summary.total_listed, 3);
    assert_eq!(summary.total_value, Decimal::from(600));
    assert_eq!(summary.average_price, Decimal::from(200));
}

#[test]
fn average_rounds_half_up() {
    let summary = summarize(&priced(&[100, 201]), &now());
    assert_eq!(summary.total_value, Decimal::from(301));
    assert_eq!(summary.average_price, Decimal::from(151));
}

#[test]
fn average_rounds_down_below_half() {
    // 100 / 3 = 33.33...
    let summary = summarize(&priced(&[10, 40, 50]), &now());
    assert_eq!(summary.average_price, Decimal::from(33));
}

#[test]
fn category_tie_goes_to_first_encountered() {
    let products = vec![
        product("1", json!(1), "electronics", "2024-01-01T00:00:00Z"),
        product("2", json!(1), "cars", "2024-01-01T00:00:00Z"),
        product("3", json!(1), "electronics", "2024-01-01T00:00:00Z"),
        product("4", json!(1), "cars", "2024-01-01T00:00:00Z"),
    ];
    assert_eq!(summarize(&products, &now()).top_category, "electronics");

    let reversed: Vec<Product> = products.into_iter().rev().collect();
    assert_eq!(summarize(&reversed, &now()).top_category, "cars");
}

#[test]
fn strictly_larger_count_beats_earlier_category() {
    let products = vec![
        product("1", json!(1), "home", "2024-01-01T00:00:00Z"),
        product("2", json!(1), "cars", "2024-01-01T00:00:00Z"),
        product("3", json!(1), "cars", "2024-01-01T00:00:00Z"),
    ];
    assert_eq!(summarize(&products, &now()).top_category, "cars");
}

#[test]
fn malformed_price_counts_but_adds_nothing() {
    let products = vec![
        product("1", json!(100), "misc", "2024-01-01T00:00:00Z"),
        product("2", json!("N/A"), "misc", "2024-01-01T00:00:00Z"),
    ];
    let summary = summarize(&products, &now());
    assert_eq!(summary.total_listed, 2);
    assert_eq!(summary.total_value, Decimal::from(100));
    assert_eq!(summary.average_price, Decimal::from(50));
}

#[test]
fn month_filter_excludes_previous_month_and_includes_first_day() {
    let products = vec![
        product("last-feb", json!(1), "misc", "2025-02-28T23:59:59Z"),
        product("first-mar", json!(1), "misc", "2025-03-01T00:00:00Z"),
        product("mid-mar", json!(1), "misc", "2025-03-14T09:30:00Z"),
        product("last-year", json!(1), "misc", "2024-03-10T09:30:00Z"),
    ];
    assert_eq!(summarize(&products, &now()).listed_this_month, 2);
}

#[test]
fn month_is_evaluated_in_the_timezone_of_now() {
    // 23:30 UTC on Feb 28 is already March 1 at UTC+1.
    let products = vec![product("edge", json!(1), "misc", "2025-02-28T23:30:00Z")];
    let casablanca = FixedOffset::east_opt(3600).unwrap();
    let local_now = now().with_timezone(&casablanca);

    assert_eq!(summarize(&products, &now()).listed_this_month, 0);
    assert_eq!(summarize(&products, &local_now).listed_this_month, 1);
}

#[test]
fn repeated_calls_are_identical() {
    let products = vec![
        product("1", json!(120), "cars", "2025-03-02T00:00:00Z"),
        product("2", json!("7.5"), "home", "2025-01-02T00:00:00Z"),
    ];
    let at = now();
    assert_eq!(summarize(&products, &at), summarize(&products, &at));
}

#[test]
fn input_is_left_untouched() {
    let products = priced(&[5, 10]);
    let before = products.clone();
    let _ = summarize(&products, &now());
    assert_eq!(products, before);
}

#[test]
fn breakdown_keeps_encounter_order_and_values() {
    let products = vec![
        product("1", json!(10), "cars", "2024-01-01T00:00:00Z"),
        product("2", json!(5), "home", "2024-01-01T00:00:00Z"),
        product("3", json!("bad"), "cars", "2024-01-01T00:00:00Z"),
    ];
    let breakdown = category_breakdown(&products);
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].category, "cars");
    assert_eq!(breakdown[0].count, 2);
    assert_eq!(breakdown[0].total_value, Decimal::from(10));
    assert_eq!(breakdown[1].category, "home");
    assert_eq!(breakdown[1].count, 1);
}

#[test]
fn empty_category_is_a_category_of_its_own() {
    let products = vec![
        product("1", json!(1), "", "2024-01-01T00:00:00Z"),
        product("2", json!(1), "", "2024-01-01T00:00:00Z"),
        product("3", json!(1), "cars", "2024-01-01T00:00:00Z"),
    ];
    assert_eq!(summarize(&products, &now()).top_category, "");
}

#[test]
fn summary_serializes_decimals_as_strings() {
    let summary = summarize(&priced(&[100, 201]), &now());
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["average_price"], json!("151"));
    assert_eq!(value["total_listed"], json!(2));
    assert_eq!(value["top_category"], json!("misc"));
}

#[test]
fn totals_saturate_instead_of_overflowing() {
    let max = "79228162514264337593543950335";
    let products = vec![
        product("a", json!(max), "cars", "2025-03-01T08:00:00Z"),
        product("b", json!(max), "cars", "2025-03-02T08:00:00Z"),
        product("c", json!(10), "home", "2025-03-03T08:00:00Z"),
    ];

    let summary = summarize(&products, &now());
    assert_eq!(summary.total_listed, 3);
    assert_eq!(summary.total_value, Decimal::MAX);
    assert_eq!(summary.top_category, "cars");

    let breakdown = category_breakdown(&products);
    assert_eq!(breakdown[0].total_value, Decimal::MAX);
    assert_eq!(breakdown[1].total_value, Decimal::from(10));
}
