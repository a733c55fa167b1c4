//! Seller-facing routes, authenticated by the seller's own backend session.

use axum::{
    extract::{FromRequestParts, Query, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Local;
use serde::Serialize;
use souq_backend::AuthUser;
use souq_core::{CategoryCount, MonthCount, NewProduct, SellerDashboard, StatsSummary};

use crate::middleware::{extract_bearer_token, RequestId};

use super::products::{to_item, LangQuery, ProductItem};
use super::{map_backend_error, map_core_error, resolve_locale, ApiError, ApiResponse, AppState};

/// A verified seller session: the raw access token plus the user it
/// resolved to.
pub(super) struct SellerSession {
    pub access_token: String,
    pub user: AuthUser,
}

impl FromRequestParts<AppState> for SellerSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let req_id = parts
            .extensions
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default();

        let Some(token) = extract_bearer_token(parts.headers.get(AUTHORIZATION)) else {
            return Err(ApiError::new(
                req_id,
                "unauthorized",
                "missing bearer token",
            ));
        };
        let access_token = token.to_string();

        let user = state
            .sessions
            .get_user(&access_token)
            .await
            .map_err(|e| map_backend_error(req_id, &e))?;

        Ok(Self { access_token, user })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SellerInfo {
    id: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardView {
    seller: SellerInfo,
    summary: StatsSummary,
    top_category_label: String,
    categories: Vec<CategoryCount>,
    monthly: Vec<MonthCount>,
    recent: Vec<ProductItem>,
}

pub(super) async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<LangQuery>,
    session: SellerSession,
) -> Result<Json<ApiResponse<DashboardView>>, ApiError> {
    let locale = resolve_locale(
        query.lang.as_deref(),
        &headers,
        state.storefront.default_locale,
    );
    let products = state
        .products
        .list_products_by_owner(&session.user.id)
        .await
        .map_err(|e| map_backend_error(req_id.0.clone(), &e))?;

    let dashboard = SellerDashboard::build(&products, &Local::now());
    let top_category_label = state
        .storefront
        .categories
        .label_for(&dashboard.summary.top_category, locale)
        .to_string();

    let data = DashboardView {
        seller: SellerInfo {
            id: session.user.id.clone(),
            email: session.user.email.clone(),
            display_name: session.user.display_name().map(ToOwned::to_owned),
        },
        recent: dashboard
            .recent
            .iter()
            .map(|p| to_item(p, &state.storefront, locale))
            .collect(),
        top_category_label,
        summary: dashboard.summary,
        categories: dashboard.categories,
        monthly: dashboard.monthly,
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    session: SellerSession,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let new_product = body.normalized();
    new_product
        .validate()
        .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    let stored = state
        .products
        .insert_product(&session.access_token, &session.user.id, &new_product)
        .await
        .map_err(|e| map_backend_error(req_id.0.clone(), &e))?;

    tracing::info!(product_id = %stored.id, owner_id = %stored.owner_id, "listing created");

    let item = to_item(&stored, &state.storefront, state.storefront.default_locale);
    Ok((StatusCode::CREATED, Json(ApiResponse::new(item, req_id.0))))
}
