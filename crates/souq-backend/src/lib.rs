//! Client for the hosted backend-as-a-service that owns souq's data.
//!
//! Products live in a PostgREST-style `products` table and identity in a
//! GoTrue-style auth service. This crate only speaks their REST contracts.

pub mod auth;
pub mod client;
pub mod error;
pub mod products;
pub mod repository;
pub(crate) mod retry;
pub mod types;

pub use client::BackendClient;
pub use error::BackendError;
pub use repository::{ProductRepository, SessionProvider};
pub use types::{AuthUser, ProductQuery, Session};
