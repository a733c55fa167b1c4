mod admin;
mod auth;
mod locale;
mod products;
mod seller;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use souq_backend::{BackendError, ProductQuery, ProductRepository, SessionProvider};
use souq_core::{AppConfig, CategoriesFile, CoreError, Locale};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RateLimits,
    RequestId,
};

/// Storefront display settings shared by every handler.
#[derive(Debug, Clone)]
pub struct Storefront {
    pub categories: CategoriesFile,
    pub default_locale: Locale,
    pub currency_label: String,
    pub whatsapp_country_code: String,
    pub marketplace_whatsapp: Option<String>,
}

impl Storefront {
    pub fn from_app_config(config: &AppConfig, categories: CategoriesFile) -> Self {
        Self {
            categories,
            default_locale: config.default_locale,
            currency_label: config.currency_label.clone(),
            whatsapp_country_code: config.whatsapp_country_code.clone(),
            marketplace_whatsapp: config.marketplace_whatsapp.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub sessions: Arc<dyn SessionProvider>,
    pub storefront: Arc<Storefront>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    backend: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "unprocessable" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(50).clamp(1, 200)
}

/// Maps backend failures to API errors. Rejected sessions and 4xx replies
/// are the caller's problem; everything else is an upstream fault.
pub(super) fn map_backend_error(request_id: String, error: &BackendError) -> ApiError {
    match error {
        BackendError::Unauthorized(_) => {
            ApiError::new(request_id, "unauthorized", "session is missing or expired")
        }
        BackendError::Api { status, message } if (400..500).contains(status) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        _ => {
            tracing::error!(error = %error, "backend request failed");
            ApiError::new(request_id, "bad_gateway", "backend request failed")
        }
    }
}

pub(super) fn map_core_error(request_id: String, error: &CoreError) -> ApiError {
    match error {
        CoreError::InvalidPhone(_) => ApiError::new(request_id, "unprocessable", error.to_string()),
        CoreError::InvalidLocale(_) | CoreError::Validation(_) => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
    }
}

/// `?lang=` first, then `Accept-Language`, then the configured default.
/// Unsupported values fall through to the next source.
pub(super) fn resolve_locale(lang: Option<&str>, headers: &HeaderMap, default: Locale) -> Locale {
    lang.and_then(|l| l.parse::<Locale>().ok())
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(souq_core::locale::negotiate)
        })
        .unwrap_or(default)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT_LANGUAGE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route(
            "/api/v1/products/{id}/whatsapp",
            get(products::whatsapp_link),
        )
        .route("/api/v1/locale/{lang}", get(locale::get_locale))
}

/// Routes authenticated by the seller's own backend session.
fn seller_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/sign-up", post(auth::sign_up))
        .route("/api/v1/auth/sign-in", post(auth::sign_in))
        .route("/api/v1/seller/dashboard", get(seller::dashboard))
        .route("/api/v1/seller/products", post(seller::create_product))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

fn admin_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/stats", get(admin::marketplace_stats))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limits: RateLimits) -> Router {
    Router::new()
        .merge(public_router())
        .merge(seller_router(rate_limits.seller))
        .merge(admin_router(auth, rate_limits.admin))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let probe = ProductQuery::default().with_limit(Some(1));

    match state.products.list_products(&probe).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    backend: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: backend unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        backend: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

/// 120 requests per minute for each seller or anonymous client, and a
/// separate 60 per minute for each operator key.
pub fn default_rate_limits() -> RateLimits {
    RateLimits {
        seller: RateLimitState::new(120, Duration::from_secs(60)),
        admin: RateLimitState::new(60, Duration::from_secs(60)),
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
