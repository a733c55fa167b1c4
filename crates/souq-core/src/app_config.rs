use std::net::SocketAddr;
use std::path::PathBuf;

use crate::locale::Locale;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the hosted backend project, e.g. `https://xyz.supabase.co`.
    pub backend_url: String,
    /// Public (anon) key sent as the `apikey` header on every backend request.
    pub backend_anon_key: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub default_locale: Locale,
    pub categories_path: PathBuf,
    /// Display-only unit appended to prices, e.g. `"DH"`.
    pub currency_label: String,
    /// Dialling prefix applied to local numbers that start with a single `0`.
    pub whatsapp_country_code: String,
    /// Fallback contact used when a listing carries no seller number.
    pub marketplace_whatsapp: Option<String>,
    pub backend_timeout_secs: u64,
    pub backend_max_retries: u32,
    pub backend_retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("backend_url", &self.backend_url)
            .field("backend_anon_key", &"[redacted]")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("default_locale", &self.default_locale)
            .field("categories_path", &self.categories_path)
            .field("currency_label", &self.currency_label)
            .field("whatsapp_country_code", &self.whatsapp_country_code)
            .field("marketplace_whatsapp", &self.marketplace_whatsapp)
            .field("backend_timeout_secs", &self.backend_timeout_secs)
            .field("backend_max_retries", &self.backend_max_retries)
            .field(
                "backend_retry_backoff_base_ms",
                &self.backend_retry_backoff_base_ms,
            )
            .finish()
    }
}
