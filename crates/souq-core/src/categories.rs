use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryLabels {
    pub ar: String,
    pub en: String,
    pub fr: String,
}

impl CategoryLabels {
    #[must_use]
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ar => &self.ar,
            Locale::En => &self.en,
            Locale::Fr => &self.fr,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub slug: String,
    pub labels: CategoryLabels,
}

/// The known categories, in display order.
///
/// Listings may carry categories outside this catalogue; those are shown by
/// their raw label.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesFile {
    pub categories: Vec<CategoryConfig>,
}

impl CategoriesFile {
    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.slug == slug)
    }

    /// Localized label for `slug`, or `slug` itself when it is not catalogued.
    #[must_use]
    pub fn label_for<'a>(&'a self, slug: &'a str, locale: Locale) -> &'a str {
        self.find(slug).map_or(slug, |c| c.labels.get(locale))
    }
}

/// Load and validate the category catalogue from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoriesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_categories(&content)
}

/// Parse and validate a category catalogue from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text cannot be parsed or fails validation.
pub fn parse_categories(yaml: &str) -> Result<CategoriesFile, ConfigError> {
    let categories_file: CategoriesFile =
        serde_yaml::from_str(yaml).map_err(ConfigError::CategoriesFileParse)?;

    validate_categories(&categories_file)?;

    Ok(categories_file)
}

fn validate_categories(categories_file: &CategoriesFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for category in &categories_file.categories {
        let slug = category.slug.trim();
        if slug.is_empty() {
            return Err(ConfigError::Validation(
                "category slug must be non-empty".to_string(),
            ));
        }

        if slug != category.slug || slug.chars().any(char::is_uppercase) {
            return Err(ConfigError::Validation(format!(
                "category slug '{}' must be lowercase without surrounding whitespace",
                category.slug
            )));
        }

        for locale in Locale::ALL {
            if category.labels.get(locale).trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "category '{slug}' is missing its '{locale}' label"
                )));
            }
        }

        if !seen_slugs.insert(slug) {
            return Err(ConfigError::Validation(format!(
                "duplicate category slug: '{slug}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
