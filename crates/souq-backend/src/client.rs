//! HTTP plumbing shared by the auth and product endpoints.
//!
//! Every request carries the project's anon key as the `apikey` header and a
//! bearer token: the signed-in user's access token when one is supplied,
//! otherwise the anon key itself.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};

use crate::error::BackendError;
use crate::retry::retry_with_backoff;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
/// Matches the table API's default `max-rows` cap.
const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Client for the hosted backend's REST APIs.
///
/// Construct once at startup and share; `reqwest::Client` pools connections
/// internally.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    anon_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    pub(crate) page_size: u32,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Creates a client for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`BackendError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("souq/0.1 (marketplace)")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends rather than
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| BackendError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            anon_key: anon_key.to_owned(),
            base_url: parsed,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Builds a client from the application config.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::new`].
    pub fn from_app_config(config: &souq_core::AppConfig) -> Result<Self, BackendError> {
        Ok(Self::new(
            &config.backend_url,
            &config.backend_anon_key,
            config.backend_timeout_secs,
        )?
        .with_retry(config.backend_max_retries, config.backend_retry_backoff_base_ms))
    }

    /// Overrides the retry policy applied to idempotent reads.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Overrides the page size used when reading unbounded listing queries.
    /// Must not exceed the project's `max-rows` setting.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Resolves `path` against the base URL and appends percent-encoded
    /// query parameters.
    pub(crate) fn endpoint<K, V>(&self, path: &str, params: &[(K, V)]) -> Result<Url, BackendError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| BackendError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k.as_ref(), v.as_ref());
            }
        }
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(self.anon_key.as_str()))
    }

    /// GETs `url` and parses the body as JSON, retrying transient failures.
    pub(crate) async fn get_json(
        &self,
        url: &Url,
        token: Option<&str>,
        context: &str,
    ) -> Result<serde_json::Value, BackendError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self.request(Method::GET, url.clone(), token).send().await?;
            read_json(response, context).await
        })
        .await
    }

    /// Sends a JSON body once (writes are not retried) and parses the reply.
    pub(crate) async fn send_json<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: &B,
        prefer: Option<&str>,
        context: &str,
    ) -> Result<serde_json::Value, BackendError> {
        let mut builder = self.request(method, url, token).json(body);
        if let Some(prefer) = prefer {
            builder = builder.header("Prefer", prefer);
        }
        let response = builder.send().await?;
        read_json(response, context).await
    }

    /// Sends a body-less request and only checks the status.
    pub(crate) async fn send_empty(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
    ) -> Result<(), BackendError> {
        let response = self.request(method, url, token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Maps non-2xx statuses to [`BackendError`] and parses 2xx bodies as JSON.
async fn read_json(response: Response, context: &str) -> Result<serde_json::Value, BackendError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| BackendError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

fn status_error(status: StatusCode, body: &str) -> BackendError {
    let message = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        BackendError::Unauthorized(message)
    } else {
        BackendError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pulls the human-readable message out of a table or auth error body.
///
/// The table API uses `message`; the auth API uses `msg`,
/// `error_description` or `error` depending on the endpoint.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str))
        .map(ToOwned::to_owned)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
