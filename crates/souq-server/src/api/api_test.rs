use std::net::SocketAddr;
use std::sync::Mutex;

use super::*;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::Request;
use chrono::TimeZone;
use rust_decimal::Decimal;
use souq_backend::{AuthUser, Session};
use souq_core::{parse_categories, NewProduct, Product};
use tower::ServiceExt;

use crate::middleware::RateLimits;

const CATEGORIES_YAML: &str = r"
categories:
  - slug: electronics
    labels: { ar: إلكترونيات, en: Electronics, fr: Électronique }
  - slug: cars
    labels: { ar: سيارات, en: Cars, fr: Voitures }
";

/// In-memory stand-in for the hosted backend.
#[derive(Default)]
struct FakeBackend {
    products: Vec<Product>,
    users: Vec<(String, AuthUser)>,
    unavailable: bool,
    inserted: Mutex<Vec<(String, String, NewProduct)>>,
}

#[async_trait]
impl ProductRepository for FakeBackend {
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, BackendError> {
        if self.unavailable {
            return Err(BackendError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(self
            .products
            .iter()
            .filter(|p| query.owner_id.as_ref().is_none_or(|o| &p.owner_id == o))
            .filter(|p| query.category.as_ref().is_none_or(|c| &p.category == c))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, BackendError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(
        &self,
        access_token: &str,
        owner_id: &str,
        product: &NewProduct,
    ) -> Result<Product, BackendError> {
        self.inserted.lock().expect("lock").push((
            access_token.to_string(),
            owner_id.to_string(),
            product.clone(),
        ));
        Ok(Product {
            id: "new-1".to_string(),
            name: product.name.clone(),
            price: Some(product.price),
            category: product.category.clone(),
            location: product.location.clone(),
            created_at: chrono::Utc::now(),
            owner_id: owner_id.to_string(),
            description: product.description.clone(),
            image_urls: product.image_urls.clone(),
            whatsapp: product.whatsapp.clone(),
        })
    }
}

#[async_trait]
impl SessionProvider for FakeBackend {
    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, BackendError> {
        Ok(user("u-new", email, display_name))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        if password != "correct-horse" {
            return Err(BackendError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(Session {
            access_token: "token-1".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            refresh_token: "refresh-1".to_string(),
            user: user("seller-1", email, None),
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        self.users
            .iter()
            .find(|(token, _)| token == access_token)
            .map(|(_, u)| u.clone())
            .ok_or_else(|| BackendError::Unauthorized("invalid JWT".to_string()))
    }
}

fn user(id: &str, email: &str, display_name: Option<&str>) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some(email.to_string()),
        user_metadata: display_name.map_or(serde_json::Value::Null, |n| {
            serde_json::json!({ "display_name": n })
        }),
        created_at: None,
    }
}

fn product(id: &str, owner: &str, category: &str, price: Option<i64>) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Listing {id}"),
        price: price.map(Decimal::from),
        category: category.to_string(),
        location: Some("Rabat".to_string()),
        created_at: chrono::Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        owner_id: owner.to_string(),
        description: Some("Good condition".to_string()),
        image_urls: vec!["https://cdn.example.co/a.jpg".to_string()],
        whatsapp: None,
    }
}

fn fake() -> FakeBackend {
    let mut phone = product("p-2", "seller-2", "electronics", Some(300));
    phone.whatsapp = Some("0612345678".to_string());
    FakeBackend {
        products: vec![
            product("p-1", "seller-1", "cars", Some(90_000)),
            phone,
            product("p-3", "seller-1", "cars", None),
        ],
        users: vec![(
            "seller-token".to_string(),
            user("seller-1", "seller@example.com", Some("Karim")),
        )],
        ..FakeBackend::default()
    }
}

fn storefront(marketplace_whatsapp: Option<&str>) -> Storefront {
    Storefront {
        categories: parse_categories(CATEGORIES_YAML).expect("categories"),
        default_locale: Locale::Ar,
        currency_label: "DH".to_string(),
        whatsapp_country_code: "212".to_string(),
        marketplace_whatsapp: marketplace_whatsapp.map(ToOwned::to_owned),
    }
}

fn app_with(backend: FakeBackend, storefront: Storefront, auth: AuthState) -> (Router, Arc<FakeBackend>) {
    app_with_limits(backend, storefront, auth, default_rate_limits())
}

fn app_with_limits(
    backend: FakeBackend,
    storefront: Storefront,
    auth: AuthState,
    limits: RateLimits,
) -> (Router, Arc<FakeBackend>) {
    let backend = Arc::new(backend);
    let state = AppState {
        products: backend.clone(),
        sessions: backend.clone(),
        storefront: Arc::new(storefront),
    };
    (build_app(state, auth, limits), backend)
}

fn from_peer(mut request: Request<Body>, ip: [u8; 4]) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((ip, 40_000))));
    request
}

fn app(backend: FakeBackend) -> Router {
    let auth = AuthState::from_keys("", true).expect("auth");
    app_with(backend, storefront(None), auth).0
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn post_json(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("unprocessable", StatusCode::UNPROCESSABLE_ENTITY),
        ("bad_gateway", StatusCode::BAD_GATEWAY),
        ("not_found", StatusCode::NOT_FOUND),
        ("something_else", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[test]
fn backend_errors_map_by_kind() {
    let unauthorized = map_backend_error("r".into(), &BackendError::Unauthorized("x".into()));
    assert_eq!(unauthorized.error.code, "unauthorized");

    let rejected = map_backend_error(
        "r".into(),
        &BackendError::Api {
            status: 409,
            message: "duplicate key".into(),
        },
    );
    assert_eq!(rejected.error.code, "validation_error");
    assert_eq!(rejected.error.message, "duplicate key");

    let upstream = map_backend_error(
        "r".into(),
        &BackendError::Api {
            status: 502,
            message: "upstream".into(),
        },
    );
    assert_eq!(upstream.error.code, "bad_gateway");
}

#[test]
fn resolve_locale_prefers_query_then_header_then_default() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT_LANGUAGE,
        "de-DE, fr;q=0.8, en;q=0.5".parse().expect("header"),
    );
    assert_eq!(resolve_locale(Some("en"), &headers, Locale::Ar), Locale::En);
    assert_eq!(resolve_locale(Some("xx"), &headers, Locale::Ar), Locale::Fr);
    assert_eq!(resolve_locale(None, &HeaderMap::new(), Locale::Ar), Locale::Ar);
}

#[tokio::test]
async fn health_reports_ok_and_degraded() {
    let (status, json) = send(app(fake()), get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");

    let down = FakeBackend {
        unavailable: true,
        ..FakeBackend::default()
    };
    let (status, json) = send(app(down), get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["status"], "degraded");
}

#[tokio::test]
async fn list_products_localizes_labels() {
    let (status, json) = send(app(fake()), get("/api/v1/products?category=CARS&lang=fr")).await;
    assert_eq!(status, StatusCode::OK);
    let rows = json["data"].as_array().expect("data array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["category_label"], "Voitures");
    assert_eq!(rows[0]["price_label"], "90000 DH");
    assert_eq!(rows[0]["cover_image"], "https://cdn.example.co/a.jpg");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn product_detail_returns_404_for_unknown_id() {
    let (status, json) = send(app(fake()), get("/api/v1/products/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");

    let (status, json) = send(app(fake()), get("/api/v1/products/p-1?lang=en")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["category_label"], "Cars");
    assert_eq!(json["data"]["has_whatsapp"], false);
}

#[tokio::test]
async fn whatsapp_link_uses_seller_number() {
    let (status, json) = send(app(fake()), get("/api/v1/products/p-2/whatsapp?lang=en")).await;
    assert_eq!(status, StatusCode::OK);
    let url = json["data"]["url"].as_str().expect("url");
    assert!(url.starts_with("https://wa.me/212612345678?text="), "got {url}");
}

#[tokio::test]
async fn whatsapp_link_falls_back_to_marketplace_number() {
    let auth = AuthState::from_keys("", true).expect("auth");
    let (router, _) = app_with(fake(), storefront(Some("+212 700 000 000")), auth);
    let (status, json) = send(router, get("/api/v1/products/p-1/whatsapp")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["url"]
        .as_str()
        .expect("url")
        .starts_with("https://wa.me/212700000000?text="));

    let (status, _) = send(app(fake()), get("/api/v1/products/p-1/whatsapp")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn whatsapp_link_rejects_malformed_number() {
    let mut backend = fake();
    backend.products[0].whatsapp = Some("12".to_string());
    let (status, json) = send(app(backend), get("/api/v1/products/p-1/whatsapp")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "unprocessable");
}

#[tokio::test]
async fn locale_bundle_includes_direction_and_categories() {
    let (status, json) = send(app(fake()), get("/api/v1/locale/ar")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["dir"], "rtl");
    assert_eq!(json["data"]["categories"][1]["label"], "سيارات");
    assert!(json["data"]["messages"]["nav.home"].is_string());

    let (status, _) = send(app(fake()), get("/api/v1/locale/de")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sign_up_validates_and_creates() {
    let (status, json) = send(
        app(fake()),
        post_json(
            "/api/v1/auth/sign-up",
            None,
            &serde_json::json!({ "email": "not-an-email", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, json) = send(
        app(fake()),
        post_json(
            "/api/v1/auth/sign-up",
            None,
            &serde_json::json!({
                "email": " new@example.com ",
                "password": "secret1",
                "display_name": "Amina"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["email"], "new@example.com");
    assert_eq!(json["data"]["display_name"], "Amina");
}

#[tokio::test]
async fn sign_in_returns_session_or_backend_message() {
    let (status, json) = send(
        app(fake()),
        post_json(
            "/api/v1/auth/sign-in",
            None,
            &serde_json::json!({ "email": "seller@example.com", "password": "correct-horse" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["access_token"], "token-1");
    assert_eq!(json["data"]["user"]["id"], "seller-1");

    let (status, json) = send(
        app(fake()),
        post_json(
            "/api/v1/auth/sign-in",
            None,
            &serde_json::json!({ "email": "seller@example.com", "password": "wrong-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "Invalid login credentials");
}

#[tokio::test]
async fn seller_dashboard_requires_valid_session() {
    let (status, _) = send(app(fake()), get("/api/v1/seller/dashboard")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/v1/seller/dashboard")
        .header(header::AUTHORIZATION, "Bearer stale-token")
        .body(Body::empty())
        .expect("request");
    let (status, json) = send(app(fake()), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn seller_dashboard_summarizes_own_listings() {
    let request = Request::builder()
        .uri("/api/v1/seller/dashboard?lang=en")
        .header(header::AUTHORIZATION, "Bearer seller-token")
        .body(Body::empty())
        .expect("request");
    let (status, json) = send(app(fake()), request).await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    assert_eq!(data["seller"]["display_name"], "Karim");
    assert_eq!(data["summary"]["total_listed"], 2);
    assert_eq!(data["summary"]["total_value"], "90000");
    assert_eq!(data["summary"]["average_price"], "45000");
    assert_eq!(data["summary"]["top_category"], "cars");
    assert_eq!(data["top_category_label"], "Cars");
    assert_eq!(data["monthly"].as_array().expect("monthly").len(), 6);
    assert_eq!(data["recent"].as_array().expect("recent").len(), 2);
}

#[tokio::test]
async fn create_product_validates_and_forwards_session() {
    let auth = AuthState::from_keys("", true).expect("auth");
    let (router, backend) = app_with(fake(), storefront(None), auth);

    let (status, json) = send(
        router.clone(),
        post_json(
            "/api/v1/seller/products",
            Some("seller-token"),
            &serde_json::json!({ "name": "  ", "price": "10", "category": "cars" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _) = send(
        router.clone(),
        post_json(
            "/api/v1/seller/products",
            Some("seller-token"),
            &serde_json::json!({ "name": "Boat", "price": "-1", "category": "boats" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        router,
        post_json(
            "/api/v1/seller/products",
            Some("seller-token"),
            &serde_json::json!({ "name": " Dacia Logan ", "price": "85000", "category": "Cars" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["name"], "Dacia Logan");

    let inserted = backend.inserted.lock().expect("lock");
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].0, "seller-token");
    assert_eq!(inserted[0].1, "seller-1");
    assert_eq!(inserted[0].2.category, "cars");
}

#[tokio::test]
async fn admin_stats_require_api_key_when_enabled() {
    let auth = AuthState::from_keys("admin-key", false).expect("auth");
    let (router, _) = app_with(fake(), storefront(None), auth);

    let (status, _) = send(router.clone(), get("/api/v1/admin/stats")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/v1/admin/stats")
        .header(header::AUTHORIZATION, "Bearer admin-key")
        .body(Body::empty())
        .expect("request");
    let (status, json) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["seller_count"], 2);
    assert_eq!(json["data"]["summary"]["total_listed"], 3);
    assert_eq!(json["data"]["summary"]["total_value"], "90300");
}

fn tight_limits(max: usize) -> RateLimits {
    RateLimits {
        seller: RateLimitState::new(max, Duration::from_secs(60)),
        admin: RateLimitState::new(max, Duration::from_secs(60)),
    }
}

fn bad_sign_in() -> Request<Body> {
    post_json(
        "/api/v1/auth/sign-in",
        None,
        &serde_json::json!({ "email": "x@example.com", "password": "wrong-pass" }),
    )
}

#[tokio::test]
async fn rate_limit_is_tracked_per_client() {
    let auth = AuthState::from_keys("", true).expect("auth");
    let (router, _) = app_with_limits(fake(), storefront(None), auth, tight_limits(3));
    let noisy = [203, 0, 113, 9];

    for _ in 0..3 {
        let (status, _) = send(router.clone(), from_peer(bad_sign_in(), noisy)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    let (status, json) = send(router.clone(), from_peer(bad_sign_in(), noisy)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");
    assert!(json["meta"]["request_id"].is_string());

    let (status, _) = send(router.clone(), from_peer(bad_sign_in(), [203, 0, 113, 10])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let dashboard = Request::builder()
        .uri("/api/v1/seller/dashboard")
        .header(header::AUTHORIZATION, "Bearer seller-token")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(router, from_peer(dashboard, noisy)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_limit_is_independent_of_seller_traffic() {
    let auth = AuthState::from_keys("", true).expect("auth");
    let (router, _) = app_with_limits(fake(), storefront(None), auth, tight_limits(3));
    let peer = [203, 0, 113, 9];

    for _ in 0..4 {
        send(router.clone(), from_peer(bad_sign_in(), peer)).await;
    }

    let (status, json) = send(router, from_peer(get("/api/v1/admin/stats"), peer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["seller_count"], 2);
}

#[tokio::test]
async fn admin_rejection_uses_error_envelope() {
    let auth = AuthState::from_keys("admin-key", false).expect("auth");
    let (router, _) = app_with(fake(), storefront(None), auth);

    let request = Request::builder()
        .uri("/api/v1/admin/stats")
        .header("x-request-id", "req-42")
        .header(header::AUTHORIZATION, "Bearer wrong-key")
        .body(Body::empty())
        .expect("request");
    let (status, json) = send(router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
    assert_eq!(json["meta"]["request_id"], "req-42");
    assert!(json["meta"]["timestamp"].is_string());
}
