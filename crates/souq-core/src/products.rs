use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::CoreError;

pub const MAX_NAME_CHARS: usize = 120;
pub const MAX_IMAGES: usize = 8;

/// A marketplace listing as stored in the hosted backend's `products` table.
///
/// Read-only on this side: rows are fetched, aggregated and rendered, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Opaque row identifier. Numeric ids are accepted and kept as strings.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    /// `None` when the stored value is missing or not a number, e.g. `"N/A"`.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "string_or_number")]
    pub owner_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_urls: Vec<String>,
    /// Seller contact number for the WhatsApp hand-off.
    #[serde(default)]
    pub whatsapp: Option<String>,
}

impl Product {
    /// The price used for arithmetic: malformed or missing prices count as zero.
    #[must_use]
    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    /// First image, used as the card thumbnail.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.image_urls.first().map(String::as_str)
    }
}

/// A listing submitted by a signed-in seller, before the backend assigns
/// `id`, `created_at` and `owner_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
}

impl NewProduct {
    /// Trims free-text fields and drops blank optional ones.
    #[must_use]
    pub fn normalized(self) -> Self {
        let blank_to_none = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        Self {
            name: self.name.trim().to_string(),
            price: self.price,
            category: self.category.trim().to_lowercase(),
            location: blank_to_none(self.location),
            description: blank_to_none(self.description),
            image_urls: self
                .image_urls
                .into_iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect(),
            whatsapp: blank_to_none(self.whatsapp),
        }
    }

    /// Checks the listing before it is sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("name must be non-empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(CoreError::Validation(format!(
                "name must be at most {MAX_NAME_CHARS} characters"
            )));
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(CoreError::Validation(
                "price must be zero or positive".to_string(),
            ));
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::Validation(
                "category must be non-empty".to_string(),
            ));
        }
        if self.image_urls.len() > MAX_IMAGES {
            return Err(CoreError::Validation(format!(
                "at most {MAX_IMAGES} images per listing"
            )));
        }
        Ok(())
    }
}

/// Formats a price for display, e.g. `"1500 DH"` or `"12.5 DH"`.
#[must_use]
pub fn format_price(price: Option<Decimal>, currency_label: &str) -> String {
    let amount = price.unwrap_or(Decimal::ZERO).normalize();
    if currency_label.is_empty() {
        amount.to_string()
    } else {
        format!("{amount} {currency_label}")
    }
}

/// Reads a JSON price cell, accepting numbers and numeric strings.
///
/// Anything else (`null`, `"N/A"`, booleans) yields `None`.
#[must_use]
pub fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .ok()
        }
        _ => None,
    }
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_price))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
