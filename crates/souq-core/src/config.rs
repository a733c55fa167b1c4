use crate::app_config::{AppConfig, Environment};
use crate::locale::Locale;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let backend_url = require("SOUQ_BACKEND_URL")?;
    let backend_anon_key = require("SOUQ_BACKEND_ANON_KEY")?;

    let env = parse_environment(&or_default("SOUQ_ENV", "development"))?;

    let bind_addr = parse("SOUQ_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SOUQ_LOG_LEVEL", "info");
    let default_locale = parse_locale(&or_default("SOUQ_DEFAULT_LOCALE", "ar"))?;
    let categories_path = PathBuf::from(or_default(
        "SOUQ_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let currency_label = or_default("SOUQ_CURRENCY_LABEL", "DH");

    let whatsapp_country_code = or_default("SOUQ_WHATSAPP_COUNTRY_CODE", "212");
    if whatsapp_country_code.is_empty()
        || !whatsapp_country_code.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ConfigError::InvalidEnvVar {
            var: "SOUQ_WHATSAPP_COUNTRY_CODE".to_string(),
            reason: format!("expected digits only, got '{whatsapp_country_code}'"),
        });
    }
    let marketplace_whatsapp = lookup("SOUQ_MARKETPLACE_WHATSAPP")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let backend_timeout_secs = parse_u64("SOUQ_BACKEND_TIMEOUT_SECS", "30")?;
    let backend_max_retries = parse_u32("SOUQ_BACKEND_MAX_RETRIES", "3")?;
    let backend_retry_backoff_base_ms = parse_u64("SOUQ_BACKEND_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(AppConfig {
        backend_url,
        backend_anon_key,
        env,
        bind_addr,
        log_level,
        default_locale,
        categories_path,
        currency_label,
        whatsapp_country_code,
        marketplace_whatsapp,
        backend_timeout_secs,
        backend_max_retries,
        backend_retry_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SOUQ_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}

fn parse_locale(s: &str) -> Result<Locale, ConfigError> {
    s.parse::<Locale>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "SOUQ_DEFAULT_LOCALE".to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
