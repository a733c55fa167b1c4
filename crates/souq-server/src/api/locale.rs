use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use souq_core::{locale, Locale, TextDirection};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CategoryLabel {
    slug: String,
    label: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LocaleBundle {
    locale: Locale,
    dir: TextDirection,
    messages: BTreeMap<&'static str, &'static str>,
    categories: Vec<CategoryLabel>,
}

/// Everything a client needs to render the storefront in `lang`.
pub(super) async fn get_locale(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(lang): Path<String>,
) -> Result<Json<ApiResponse<LocaleBundle>>, ApiError> {
    let locale: Locale = lang.parse().map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("unsupported locale: {lang}"),
        )
    })?;

    let categories = state
        .storefront
        .categories
        .categories
        .iter()
        .map(|c| CategoryLabel {
            slug: c.slug.clone(),
            label: c.labels.get(locale).to_string(),
        })
        .collect();

    let data = LocaleBundle {
        locale,
        dir: locale.dir(),
        messages: locale::table(locale),
        categories,
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
