use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souq_core::{format_price, whatsapp, Locale, Product};

use crate::middleware::RequestId;

use super::{
    map_backend_error, map_core_error, normalize_limit, resolve_locale, ApiError, ApiResponse,
    AppState, Storefront,
};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: String,
    name: String,
    price: Option<Decimal>,
    price_label: String,
    category: String,
    category_label: String,
    location: Option<String>,
    cover_image: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    #[serde(flatten)]
    item: ProductItem,
    description: Option<String>,
    image_urls: Vec<String>,
    owner_id: String,
    has_whatsapp: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct WhatsappLink {
    product_id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub limit: Option<u32>,
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LangQuery {
    pub lang: Option<String>,
}

pub(super) fn to_item(product: &Product, storefront: &Storefront, locale: Locale) -> ProductItem {
    ProductItem {
        id: product.id.clone(),
        name: product.name.clone(),
        price: product.price,
        price_label: format_price(product.price, &storefront.currency_label),
        category: product.category.clone(),
        category_label: storefront
            .categories
            .label_for(&product.category, locale)
            .to_string(),
        location: product.location.clone(),
        cover_image: product.cover_image().map(ToOwned::to_owned),
        created_at: product.created_at,
    }
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let locale = resolve_locale(
        query.lang.as_deref(),
        &headers,
        state.storefront.default_locale,
    );
    let filter = souq_backend::ProductQuery::default()
        .with_category(query.category.map(|c| c.trim().to_lowercase()))
        .with_search(query.q)
        .with_limit(Some(normalize_limit(query.limit)));

    let products = state
        .products
        .list_products(&filter)
        .await
        .map_err(|e| map_backend_error(req_id.0.clone(), &e))?;

    let data = products
        .iter()
        .map(|p| to_item(p, &state.storefront, locale))
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let locale = resolve_locale(
        query.lang.as_deref(),
        &headers,
        state.storefront.default_locale,
    );
    let product = fetch_product(&state, &req_id, &id).await?;

    let data = ProductDetail {
        item: to_item(&product, &state.storefront, locale),
        description: product.description.clone(),
        image_urls: product.image_urls.clone(),
        owner_id: product.owner_id.clone(),
        has_whatsapp: product.whatsapp.is_some() || state.storefront.marketplace_whatsapp.is_some(),
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// Order link for a listing: the seller's own number when the listing has
/// one, otherwise the marketplace number.
pub(super) async fn whatsapp_link(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<LangQuery>,
) -> Result<Json<ApiResponse<WhatsappLink>>, ApiError> {
    let locale = resolve_locale(
        query.lang.as_deref(),
        &headers,
        state.storefront.default_locale,
    );
    let product = fetch_product(&state, &req_id, &id).await?;

    let Some(phone) = product
        .whatsapp
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .or(state.storefront.marketplace_whatsapp.as_deref())
    else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no WhatsApp contact for product {id}"),
        ));
    };

    let url = whatsapp::order_link(
        phone,
        &product,
        locale,
        &state.storefront.currency_label,
        &state.storefront.whatsapp_country_code,
    )
    .map_err(|e| map_core_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        WhatsappLink {
            product_id: product.id,
            url,
        },
        req_id.0,
    )))
}

async fn fetch_product(state: &AppState, req_id: &RequestId, id: &str) -> Result<Product, ApiError> {
    state
        .products
        .get_product(id)
        .await
        .map_err(|e| map_backend_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", format!("product {id} not found")))
}
