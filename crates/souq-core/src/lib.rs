pub mod app_config;
pub mod categories;
pub mod config;
pub mod dashboard;
pub mod locale;
pub mod products;
pub mod stats;
pub mod whatsapp;

pub use app_config::{AppConfig, Environment};
pub use categories::{load_categories, parse_categories, CategoriesFile, CategoryConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use dashboard::{MarketplaceStats, MonthCount, SellerDashboard};
pub use locale::{Locale, TextDirection};
pub use products::{format_price, NewProduct, Product};
pub use stats::{category_breakdown, summarize, summarize_now, CategoryCount, StatsSummary};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("invalid locale: {0}")]
    InvalidLocale(String),

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[from] serde_yaml::Error),

    #[error("categories validation error: {0}")]
    Validation(String),
}
