use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Windows tracked before expired ones are swept.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Operator API keys guarding the admin routes.
///
/// Sellers authenticate with their backend session instead; see
/// `api::seller::SellerSession`.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `SOUQ_API_KEYS` (comma-separated bearer tokens).
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("SOUQ_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// In development, empty keys disable admin auth for local iteration.
    /// In other environments, empty keys fail startup.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!("SOUQ_API_KEYS not set; admin auth disabled in development");
                return Ok(Self {
                    api_keys: Arc::new(HashSet::new()),
                    enabled: false,
                });
            }
            anyhow::bail!("SOUQ_API_KEYS is required outside development");
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys
            .iter()
            .any(|key| bool::from(key.as_bytes().ct_eq(token.as_bytes())))
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter keyed per client.
///
/// A client is its bearer token when one is sent, otherwise its peer address.
/// Each router group gets its own instance so one group cannot drain another.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts one request for `client`; `false` once its window is spent.
    async fn admit(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        if clients.len() >= MAX_TRACKED_CLIENTS && !clients.contains_key(client) {
            clients.retain(|_, w| now.duration_since(w.started_at) < self.window);
        }

        let window = clients.entry(client.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now.duration_since(window.started_at) >= self.window {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

/// Seller and operator limits, tracked independently.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub seller: RateLimitState,
    pub admin: RateLimitState,
}

/// Extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused; otherwise a `UUIDv4` is
/// generated. The ID is stored as a [`RequestId`] extension and echoed on
/// the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Rejects admin requests without a configured operator key.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => ApiError::new(
            request_id_of(&req),
            "unauthorized",
            "missing or invalid bearer token",
        )
        .into_response(),
    }
}

pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);
    if rate_limit.admit(&client).await {
        return next.run(req).await;
    }

    tracing::warn!(client = %redact_client(&client), "rate limit exceeded");
    ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded").into_response()
}

pub(crate) fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `token:<bearer>`, else `ip:<peer>`, else a shared anonymous bucket when
/// the server runs without connect info.
fn client_key(req: &Request) -> String {
    if let Some(token) = extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        return format!("token:{token}");
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(
            || "anonymous".to_string(),
            |ConnectInfo(addr)| format!("ip:{}", addr.ip()),
        )
}

fn redact_client(key: &str) -> &str {
    if key.starts_with("token:") {
        "token:[redacted]"
    } else {
        key
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn extract_bearer_token_rejects_blank_token() {
        let header = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        assert_eq!(extract_bearer_token(None), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_keys("", true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_keys(" , ", false).is_err());
    }

    #[test]
    fn auth_state_parses_comma_separated_keys() {
        let state = AuthState::from_keys("alpha, beta ,", false).expect("keys present");
        assert!(state.enabled);
        assert!(state.allows("alpha"));
        assert!(state.allows("beta"));
        assert!(!state.allows("gamma"));
        assert!(!state.allows("alph"));
    }

    #[tokio::test]
    async fn windows_are_counted_per_client() {
        let limit = RateLimitState::new(2, Duration::from_secs(60));
        assert!(limit.admit("ip:10.0.0.1").await);
        assert!(limit.admit("ip:10.0.0.1").await);
        assert!(!limit.admit("ip:10.0.0.1").await);
        assert!(limit.admit("ip:10.0.0.2").await);
        assert!(limit.admit("token:seller").await);
    }

    #[tokio::test]
    async fn window_resets_after_expiry() {
        let limit = RateLimitState::new(1, Duration::from_millis(20));
        assert!(limit.admit("ip:10.0.0.1").await);
        assert!(!limit.admit("ip:10.0.0.1").await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limit.admit("ip:10.0.0.1").await);
    }

    #[test]
    fn client_key_prefers_bearer_then_peer_address() {
        let mut req = Request::builder()
            .uri("/")
            .body(axum::body::Body::empty())
            .expect("request");
        assert_eq!(client_key(&req), "anonymous");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 7], 4000))));
        assert_eq!(client_key(&req), "ip:192.0.2.7");

        req.headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(client_key(&req), "token:abc");
        assert_eq!(redact_client("token:abc"), "token:[redacted]");
    }
}
