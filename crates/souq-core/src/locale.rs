//! Storefront locales and the static translation table.
//!
//! Every key in the table carries a string for all three locales, so lookups
//! only miss for unknown keys, which fall back to the key itself.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ar,
    En,
    Fr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Rtl,
    Ltr,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Ar, Locale::En, Locale::Fr];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Locale::Ar => "ar",
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    #[must_use]
    pub fn dir(self) -> TextDirection {
        match self {
            Locale::Ar => TextDirection::Rtl,
            Locale::En | Locale::Fr => TextDirection::Ltr,
        }
    }

    fn column(self) -> usize {
        match self {
            Locale::Ar => 0,
            Locale::En => 1,
            Locale::Fr => 2,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = CoreError;

    /// Accepts bare codes (`"fr"`) and region-tagged tags (`"fr-FR"`, `"ar_MA"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "ar" => Ok(Locale::Ar),
            "en" => Ok(Locale::En),
            "fr" => Ok(Locale::Fr),
            _ => Err(CoreError::InvalidLocale(s.to_string())),
        }
    }
}

/// Picks the highest-weighted supported locale from an `Accept-Language`
/// header value. Entries with equal weight keep their header order.
#[must_use]
pub fn negotiate(accept_language: &str) -> Option<Locale> {
    let mut candidates: Vec<(Locale, f32)> = accept_language
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            let weight = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            let locale = tag.parse::<Locale>().ok()?;
            (weight > 0.0).then_some((locale, weight))
        })
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates.first().map(|(locale, _)| *locale)
}

/// `(key, [ar, en, fr])`
const MESSAGES: &[(&str, [&str; 3])] = &[
    ("nav.home", ["الرئيسية", "Home", "Accueil"]),
    ("nav.sell", ["بيع منتج", "Sell an item", "Vendre un article"]),
    ("nav.dashboard", ["لوحة التحكم", "Dashboard", "Tableau de bord"]),
    ("nav.admin", ["الإدارة", "Admin", "Administration"]),
    ("nav.sign_in", ["تسجيل الدخول", "Sign in", "Se connecter"]),
    ("nav.sign_up", ["إنشاء حساب", "Sign up", "Créer un compte"]),
    ("nav.sign_out", ["تسجيل الخروج", "Sign out", "Se déconnecter"]),
    ("product.price", ["السعر", "Price", "Prix"]),
    ("product.category", ["الفئة", "Category", "Catégorie"]),
    ("product.location", ["الموقع", "Location", "Lieu"]),
    ("product.description", ["الوصف", "Description", "Description"]),
    (
        "product.order_whatsapp",
        ["اطلب عبر واتساب", "Order on WhatsApp", "Commander sur WhatsApp"],
    ),
    (
        "dashboard.total_listed",
        ["إجمالي المنتجات", "Total listed", "Total des annonces"],
    ),
    (
        "dashboard.total_value",
        ["القيمة الإجمالية", "Total value", "Valeur totale"],
    ),
    (
        "dashboard.average_price",
        ["متوسط السعر", "Average price", "Prix moyen"],
    ),
    (
        "dashboard.top_category",
        ["الفئة الأكثر نشراً", "Top category", "Catégorie principale"],
    ),
    (
        "dashboard.listed_this_month",
        ["منتجات هذا الشهر", "Listed this month", "Publiés ce mois-ci"],
    ),
    (
        "dashboard.recent_listings",
        ["أحدث المنتجات", "Recent listings", "Annonces récentes"],
    ),
    ("admin.seller_count", ["عدد البائعين", "Sellers", "Vendeurs"]),
    (
        "empty.no_products",
        [
            "لا توجد منتجات بعد",
            "No products yet",
            "Aucun produit pour le moment",
        ],
    ),
    (
        "auth.not_signed_in",
        [
            "يرجى تسجيل الدخول",
            "Please sign in",
            "Veuillez vous connecter",
        ],
    ),
    (
        "whatsapp.order_message",
        [
            "مرحباً، أنا مهتم بـ {name} بسعر {price} (رقم المنتج: {id})",
            "Hello, I'm interested in {name} for {price} (product #{id})",
            "Bonjour, je suis intéressé(e) par {name} à {price} (produit n° {id})",
        ],
    ),
];

/// Looks up `key` for `locale`, returning the key itself when it is unknown.
#[must_use]
pub fn translate<'a>(locale: Locale, key: &'a str) -> &'a str {
    MESSAGES
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(key, |(_, texts)| texts[locale.column()])
}

/// The full table for one locale, keyed by message key.
#[must_use]
pub fn table(locale: Locale) -> BTreeMap<&'static str, &'static str> {
    MESSAGES
        .iter()
        .map(|(k, texts)| (*k, texts[locale.column()]))
        .collect()
}
