//! Seams between the HTTP layer and the hosted backend.
//!
//! The server holds these as `Arc<dyn …>` so handlers can be exercised
//! against in-memory fakes; [`BackendClient`] is the production implementation.

use async_trait::async_trait;
use souq_core::{NewProduct, Product};

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::types::{AuthUser, ProductQuery, Session};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Listings matching `query`, newest first.
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError>;

    /// Every listing owned by `owner_id`, newest first.
    async fn list_products_by_owner(&self, owner_id: &str) -> Result<Vec<Product>, BackendError> {
        self.list_products(&ProductQuery::for_owner(owner_id)).await
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, BackendError>;

    async fn insert_product(
        &self,
        access_token: &str,
        owner_id: &str,
        product: &NewProduct,
    ) -> Result<Product, BackendError>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError>;

    /// Resolves a bearer token to its user; rejects with
    /// [`BackendError::Unauthorized`] when the session is not valid.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError>;
}

#[async_trait]
impl ProductRepository for BackendClient {
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        BackendClient::list_products(self, query).await
    }

    async fn list_products_by_owner(&self, owner_id: &str) -> Result<Vec<Product>, BackendError> {
        BackendClient::list_products_by_owner(self, owner_id).await
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, BackendError> {
        BackendClient::get_product(self, id).await
    }

    async fn insert_product(
        &self,
        access_token: &str,
        owner_id: &str,
        product: &NewProduct,
    ) -> Result<Product, BackendError> {
        BackendClient::insert_product(self, access_token, owner_id, product).await
    }
}

#[async_trait]
impl SessionProvider for BackendClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, BackendError> {
        BackendClient::sign_up(self, email, password, display_name).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        BackendClient::sign_in_with_password(self, email, password).await
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        BackendClient::get_user(self, access_token).await
    }
}
