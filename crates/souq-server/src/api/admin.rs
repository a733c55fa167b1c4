use axum::{extract::State, Extension, Json};
use chrono::Local;
use souq_backend::ProductQuery;
use souq_core::MarketplaceStats;

use crate::middleware::RequestId;

use super::{map_backend_error, ApiError, ApiResponse, AppState};

/// Marketplace-wide totals across every seller's listings.
pub(super) async fn marketplace_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<MarketplaceStats>>, ApiError> {
    let products = state
        .products
        .list_products(&ProductQuery::default())
        .await
        .map_err(|e| map_backend_error(req_id.0.clone(), &e))?;

    let data = MarketplaceStats::build(&products, &Local::now());
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
