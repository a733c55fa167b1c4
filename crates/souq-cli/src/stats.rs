//! Dashboard statistics commands: `stats` and `marketplace`.

use std::fmt::Write as _;

use chrono::Local;
use souq_backend::{BackendClient, ProductQuery};
use souq_core::{
    format_price, locale::translate, AppConfig, CategoriesFile, CategoryCount, Locale,
    MarketplaceStats, SellerDashboard, StatsSummary,
};

/// Prints the dashboard summary for one seller.
///
/// # Errors
///
/// Returns an error if the backend query fails.
pub(crate) async fn run_seller_stats(
    client: &BackendClient,
    config: &AppConfig,
    categories: &CategoriesFile,
    owner_id: &str,
) -> anyhow::Result<()> {
    let products = client.list_products_by_owner(owner_id).await?;
    let dashboard = SellerDashboard::build(&products, &Local::now());
    let locale = config.default_locale;

    println!("Seller: {owner_id}");
    print!(
        "{}",
        render_summary(&dashboard.summary, categories, locale, &config.currency_label)
    );
    println!();
    print!(
        "{}",
        render_categories(&dashboard.categories, categories, locale, &config.currency_label)
    );
    println!();
    println!("MONTH    LISTED");
    for month in &dashboard.monthly {
        println!("{:04}-{:02}  {}", month.year, month.month, month.count);
    }
    Ok(())
}

/// Prints marketplace-wide statistics across every seller.
///
/// # Errors
///
/// Returns an error if the backend query fails.
pub(crate) async fn run_marketplace_stats(
    client: &BackendClient,
    config: &AppConfig,
    categories: &CategoriesFile,
) -> anyhow::Result<()> {
    let products = client.list_products(&ProductQuery::default()).await?;
    let stats = MarketplaceStats::build(&products, &Local::now());
    let locale = config.default_locale;

    println!(
        "{}: {}",
        translate(locale, "admin.seller_count"),
        stats.seller_count
    );
    print!(
        "{}",
        render_summary(&stats.summary, categories, locale, &config.currency_label)
    );
    println!();
    print!(
        "{}",
        render_categories(&stats.categories, categories, locale, &config.currency_label)
    );
    Ok(())
}

/// One `label: value` line per summary field, labels in `locale`.
pub(crate) fn render_summary(
    summary: &StatsSummary,
    categories: &CategoriesFile,
    locale: Locale,
    currency_label: &str,
) -> String {
    let rows = [
        ("dashboard.total_listed", summary.total_listed.to_string()),
        (
            "dashboard.total_value",
            format_price(Some(summary.total_value), currency_label),
        ),
        (
            "dashboard.average_price",
            format_price(Some(summary.average_price), currency_label),
        ),
        (
            "dashboard.top_category",
            categories
                .label_for(&summary.top_category, locale)
                .to_string(),
        ),
        (
            "dashboard.listed_this_month",
            summary.listed_this_month.to_string(),
        ),
    ];

    let mut out = String::new();
    for (key, value) in rows {
        let _ = writeln!(out, "{}: {value}", translate(locale, key));
    }
    out
}

pub(crate) fn render_categories(
    breakdown: &[CategoryCount],
    categories: &CategoriesFile,
    locale: Locale,
    currency_label: &str,
) -> String {
    let mut out = format!("{:<24}{:<8}VALUE\n", "CATEGORY", "COUNT");
    for row in breakdown {
        let label = if row.category.is_empty() {
            "\u{2014}"
        } else {
            categories.label_for(&row.category, locale)
        };
        let _ = writeln!(
            out,
            "{:<24}{:<8}{}",
            label,
            row.count,
            format_price(Some(row.total_value), currency_label)
        );
    }
    out
}
