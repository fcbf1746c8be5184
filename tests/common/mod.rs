#![allow(dead_code)]

use axum::{
    body::{self, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use restaurant_api::{
    auth::Claims,
    build_app,
    config::AppConfig,
    db,
    entities::{
        category,
        coupon::{self, CouponType},
        menu_item,
    },
    AppState,
};

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Application harness backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    _dir: TempDir,
}

/// Coupon fields a test cares about; the rest take neutral defaults
#[derive(Debug, Clone)]
pub struct CouponSeed {
    pub code: &'static str,
    pub coupon_type: CouponType,
    pub discount: Decimal,
    pub category_id: Option<i32>,
    pub buy_x: Option<i32>,
    pub min_cart_amount: Option<Decimal>,
    pub quantity: Option<i32>,
    pub valid_from: Option<chrono::DateTime<Utc>>,
    pub valid_to: Option<chrono::DateTime<Utc>>,
    pub is_active: bool,
}

impl CouponSeed {
    pub fn new(code: &'static str, coupon_type: CouponType, discount: Decimal) -> Self {
        Self {
            code,
            coupon_type,
            discount,
            category_id: None,
            buy_x: None,
            min_cart_amount: None,
            quantity: None,
            valid_from: None,
            valid_to: None,
            is_active: true,
        }
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Builds the app after letting the caller adjust configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("restaurant_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 4;
        cfg.db_min_connections = 1;
        cfg.order_retry_attempts = 1;
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(pool, cfg.clone());
        let router = build_app(state.clone());
        let admin_token = Self::token_for(&cfg, &["admin"], Duration::hours(1));

        Self {
            router,
            state,
            admin_token,
            _dir: dir,
        }
    }

    /// Signs a token the way the external login service would
    pub fn token_for(cfg: &AppConfig, roles: &[&str], ttl: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: "staff-1".to_string(),
            name: Some("Test Admin".to_string()),
            email: Some("admin@example.com".to_string()),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            jti: Some("test-token".to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: cfg.auth_issuer.clone(),
            aud: cfg.auth_audience.clone(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        )
        .expect("sign test token")
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        self.send(method, uri, body, None).await
    }

    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let token = self.admin_token.clone();
        self.send(method, uri, body, Some(&token)).await
    }

    pub async fn request_with_token(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: &str,
    ) -> Response<Body> {
        self.send(method, uri, body, Some(token)).await
    }

    /// Sends the request with the token in the `token` cookie instead of a header
    pub async fn request_with_cookie(&self, method: Method, uri: &str, token: &str) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, format!("theme=dark; token={token}"))
            .body(Body::empty())
            .expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("build request"),
            None => builder.body(Body::empty()).expect("build request"),
        };

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    pub async fn seed_category(&self, name: &str) -> i32 {
        category::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("insert category")
        .id
    }

    pub async fn seed_menu_item(&self, name: &str, price: Decimal, category_id: i32) -> i32 {
        let now = Utc::now();
        menu_item::ActiveModel {
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            saved_amount: Set(None),
            image_url: Set(None),
            category_id: Set(category_id),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("insert menu item")
        .id
    }

    pub async fn seed_coupon(&self, seed: CouponSeed) -> coupon::Model {
        let now = Utc::now();
        coupon::ActiveModel {
            code: Set(seed.code.to_string()),
            description: Set(None),
            image_url: Set(None),
            discount: Set(seed.discount),
            coupon_type: Set(seed.coupon_type),
            category_id: Set(seed.category_id),
            buy_x: Set(seed.buy_x),
            min_cart_amount: Set(seed.min_cart_amount),
            valid_from: Set(seed.valid_from),
            valid_to: Set(seed.valid_to),
            quantity: Set(seed.quantity),
            is_active: Set(seed.is_active),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("insert coupon")
    }

    pub async fn coupon_quantity(&self, id: i32) -> Option<i32> {
        coupon::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("query coupon")
            .expect("coupon exists")
            .quantity
    }
}

/// Reads a response body as JSON
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}

/// Asserts the status and returns the parsed body
pub async fn expect_status(response: Response<Body>, status: StatusCode) -> Value {
    let actual = response.status();
    let json = read_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json
}

/// Parses a decimal that the API serialised as a JSON string
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .map(|s| s.parse::<Decimal>().expect("decimal string"))
        .or_else(|| value.as_f64().and_then(|f| Decimal::try_from(f).ok()))
        .unwrap_or_else(|| panic!("not a decimal: {value}"))
}
