//! Listing browsing commands: `products`, `whatsapp`, `categories`.

use std::fmt::Write as _;

use souq_backend::{BackendClient, ProductQuery};
use souq_core::{format_price, whatsapp, AppConfig, CategoriesFile, Locale, Product};

const NAME_WIDTH: usize = 40;

/// `--lang` when given, otherwise the configured default.
pub(crate) fn pick_locale(lang: Option<&str>, default: Locale) -> anyhow::Result<Locale> {
    match lang {
        Some(code) => Ok(code.parse()?),
        None => Ok(default),
    }
}

/// Prints the newest listings matching `query`.
///
/// # Errors
///
/// Returns an error if the backend query fails.
pub(crate) async fn run_products(
    client: &BackendClient,
    config: &AppConfig,
    categories: &CategoriesFile,
    query: &ProductQuery,
    locale: Locale,
) -> anyhow::Result<()> {
    let products = client.list_products(query).await?;
    if products.is_empty() {
        println!("{}", souq_core::locale::translate(locale, "empty.no_products"));
        return Ok(());
    }
    print!(
        "{}",
        render_products(&products, categories, locale, &config.currency_label)
    );
    Ok(())
}

/// Prints the WhatsApp order link for one listing.
///
/// Uses the listing's own number, falling back to `SOUQ_MARKETPLACE_WHATSAPP`.
///
/// # Errors
///
/// Returns an error if the listing does not exist, has no usable contact
/// number, or the backend query fails.
pub(crate) async fn run_whatsapp(
    client: &BackendClient,
    config: &AppConfig,
    product_id: &str,
    locale: Locale,
) -> anyhow::Result<()> {
    let product = client
        .get_product(product_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product '{product_id}' not found"))?;

    let phone = product
        .whatsapp
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .or(config.marketplace_whatsapp.as_deref())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "product '{product_id}' has no WhatsApp number and SOUQ_MARKETPLACE_WHATSAPP is not set"
            )
        })?;

    let link = whatsapp::order_link(
        phone,
        &product,
        locale,
        &config.currency_label,
        &config.whatsapp_country_code,
    )?;
    println!("{link}");
    Ok(())
}

pub(crate) fn render_products(
    products: &[Product],
    categories: &CategoriesFile,
    locale: Locale,
    currency_label: &str,
) -> String {
    let mut out = format!(
        "{:<12}{:<42}{:<16}{:<20}{:<18}LISTED\n",
        "ID", "NAME", "PRICE", "CATEGORY", "LOCATION"
    );
    for product in products {
        let _ = writeln!(
            out,
            "{:<12}{:<42}{:<16}{:<20}{:<18}{}",
            product.id,
            truncate(&product.name, NAME_WIDTH),
            format_price(product.price, currency_label),
            categories.label_for(&product.category, locale),
            product.location.as_deref().unwrap_or("\u{2014}"),
            product.created_at.format("%Y-%m-%d"),
        );
    }
    out
}

pub(crate) fn render_categories(categories: &CategoriesFile, locale: Locale) -> String {
    let mut out = format!("{:<16}LABEL ({locale})\n", "SLUG");
    for category in &categories.categories {
        let _ = writeln!(out, "{:<16}{}", category.slug, category.labels.get(locale));
    }
    out
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
