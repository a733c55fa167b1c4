//! `products` table endpoints.

use reqwest::Method;
use souq_core::{NewProduct, Product};

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::types::{ProductInsert, ProductQuery};

const PRODUCTS_PATH: &str = "rest/v1/products";

impl BackendClient {
    /// Reads listings matching `query`, newest first.
    ///
    /// With an explicit `limit` this is a single request. Without one, the
    /// table is read page by page (see [`BackendClient::with_page_size`])
    /// until a short page comes back, so results are never cut at the
    /// backend's row cap.
    ///
    /// Rows that cannot be decoded at all (no id or timestamp) are logged and
    /// skipped; rows with a malformed price are kept with `price: None`.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Api`] if the table API rejects the query.
    /// - [`BackendError::Http`] on network failure.
    /// - [`BackendError::Deserialize`] if the response is not a JSON array.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        if query.limit.is_some() {
            let rows = self.fetch_rows(query).await?;
            return Ok(decode_rows(rows, "products"));
        }

        let page_size = self.page_size;
        let mut products = Vec::new();
        let mut offset = query.offset.unwrap_or(0);
        loop {
            let page = query
                .clone()
                .with_limit(Some(page_size))
                .with_offset(Some(offset));
            let rows = self.fetch_rows(&page).await?;
            let fetched = rows.len();
            products.extend(decode_rows(rows, "products"));

            if fetched < usize::try_from(page_size).unwrap_or(usize::MAX) {
                break;
            }
            let Some(next) = offset.checked_add(page_size) else {
                tracing::warn!(offset, "stopping product pagination at u32 offset limit");
                break;
            };
            offset = next;
            tracing::debug!(offset, "fetching next products page");
        }
        Ok(products)
    }

    async fn fetch_rows(&self, query: &ProductQuery) -> Result<Vec<serde_json::Value>, BackendError> {
        let url = self.endpoint(PRODUCTS_PATH, &query.to_params())?;
        let body = self.get_json(&url, None, "products").await?;
        json_rows(body, "products")
    }

    /// Every listing owned by `owner_id`, newest first.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_products`].
    pub async fn list_products_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Product>, BackendError> {
        self.list_products(&ProductQuery::for_owner(owner_id)).await
    }

    /// Fetches one listing by id, or `None` if no row matches.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::list_products`].
    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, BackendError> {
        let filter = format!("eq.{id}");
        let url = self.endpoint(
            PRODUCTS_PATH,
            &[("select", "*"), ("id", filter.as_str()), ("limit", "1")],
        )?;
        let body = self.get_json(&url, None, "products(id)").await?;
        let rows = json_rows(body, "products(id)")?;
        Ok(decode_rows(rows, "products(id)").into_iter().next())
    }

    /// Inserts a listing on behalf of the signed-in seller.
    ///
    /// The user's access token is forwarded so the backend's row-level
    /// policies can check that `owner_id` matches the session.
    ///
    /// # Errors
    ///
    /// - [`BackendError::Unauthorized`] if the session is rejected.
    /// - [`BackendError::Api`] if the insert violates a table constraint.
    /// - [`BackendError::EmptyResponse`] if no row representation comes back.
    pub async fn insert_product(
        &self,
        access_token: &str,
        owner_id: &str,
        product: &NewProduct,
    ) -> Result<Product, BackendError> {
        let url = self.endpoint::<&str, &str>(PRODUCTS_PATH, &[])?;
        let body = ProductInsert { product, owner_id };
        let response = self
            .send_json(
                Method::POST,
                url,
                Some(access_token),
                &body,
                Some("return=representation"),
                "products(insert)",
            )
            .await?;
        decode_rows(json_rows(response, "products(insert)")?, "products(insert)")
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::EmptyResponse("products(insert)".to_string()))
    }
}

fn json_rows(body: serde_json::Value, context: &str) -> Result<Vec<serde_json::Value>, BackendError> {
    serde_json::from_value(body).map_err(|e| BackendError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

fn decode_rows(rows: Vec<serde_json::Value>, context: &str) -> Vec<Product> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<Product>(row) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!(error = %e, context, "skipping undecodable product row");
                None
            }
        })
        .collect()
}
