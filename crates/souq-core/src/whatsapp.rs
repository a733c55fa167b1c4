//! WhatsApp deep links used in place of an in-app checkout.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::locale::{translate, Locale};
use crate::products::{format_price, Product};
use crate::CoreError;

pub const WHATSAPP_BASE_URL: &str = "https://wa.me/";

const MIN_DIGITS: usize = 8;
const MAX_DIGITS: usize = 15;

/// Reduces a phone number to the international digits `wa.me` expects.
///
/// `+` and `00` prefixes are dropped; a single leading `0` marks a national
/// number and is replaced by `country_code`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPhone`] if the result is not 8 to 15 digits
/// or still begins with `0`.
pub fn normalize_phone(raw: &str, country_code: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    let international = if trimmed.starts_with('+') {
        digits
    } else if let Some(rest) = digits.strip_prefix("00") {
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("{country_code}{rest}")
    } else {
        digits
    };

    // country codes never start with 0
    if international.starts_with('0')
        || !(MIN_DIGITS..=MAX_DIGITS).contains(&international.len())
    {
        return Err(CoreError::InvalidPhone(raw.to_string()));
    }

    Ok(international)
}

/// The localized pre-filled message naming the product, its price and id.
#[must_use]
pub fn order_message(product: &Product, locale: Locale, currency_label: &str) -> String {
    translate(locale, "whatsapp.order_message")
        .replace("{name}", product.name.trim())
        .replace("{price}", &format_price(product.price, currency_label))
        .replace("{id}", &product.id)
}

/// Builds `https://wa.me/<digits>?text=<message>` for ordering `product`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPhone`] if `phone` cannot be normalized.
pub fn order_link(
    phone: &str,
    product: &Product,
    locale: Locale,
    currency_label: &str,
    country_code: &str,
) -> Result<String, CoreError> {
    let number = normalize_phone(phone, country_code)?;
    let message = order_message(product, locale, currency_label);
    Ok(format!(
        "{WHATSAPP_BASE_URL}{number}?text={}",
        utf8_percent_encode(&message, NON_ALPHANUMERIC)
    ))
}
