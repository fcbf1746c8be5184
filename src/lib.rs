//! Restaurant API Library
//!
//! Public menu browsing and order placement with coupon pricing, plus the
//! admin surface for managing the catalog, coupons, promotions and orders.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer};
use utoipa::ToSchema;

use crate::auth::{admin_auth_middleware, AuthConfig, AuthService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: config::AppConfig) -> Self {
        let db = Arc::new(db);
        let services = handlers::AppServices::new(db.clone(), &config);
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        Self {
            db,
            config,
            services,
            auth,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        assert!(!response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Customer-facing routes; no authentication
fn public_routes() -> Router<AppState> {
    use handlers::{categories, coupons, menu, orders, promotions, top_picks};

    Router::new()
        .route("/menu", get(menu::list_menu))
        .route("/menu/:id", get(menu::get_menu_item))
        .route("/categories", get(categories::list_categories))
        .route("/top-picks", get(top_picks::list_top_picks))
        .route("/coupons", get(coupons::list_active_coupons))
        .route("/coupons/validate", post(coupons::preview_coupon))
        .route("/promotions", get(promotions::list_running_promotions))
        .route("/orders", post(orders::place_order))
}

/// Management routes; every one requires an admin bearer token
fn admin_routes(auth: Arc<AuthService>) -> Router<AppState> {
    use handlers::{categories, coupons, menu, orders, promotions, top_picks};

    Router::new()
        .route(
            "/menu",
            get(menu::admin_list_menu).post(menu::create_menu_item),
        )
        .route(
            "/menu/:id",
            put(menu::update_menu_item).delete(menu::delete_menu_item),
        )
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/:id",
            put(categories::rename_category).delete(categories::delete_category),
        )
        .route(
            "/top-picks",
            get(top_picks::admin_list_top_picks).post(top_picks::add_top_pick),
        )
        .route("/top-picks/:id", axum::routing::delete(top_picks::remove_top_pick))
        .route(
            "/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route(
            "/coupons/:id",
            get(coupons::get_coupon)
                .put(coupons::update_coupon)
                .delete(coupons::delete_coupon),
        )
        .route(
            "/promotions",
            get(promotions::list_promotions).post(promotions::create_promotion),
        )
        .route(
            "/promotions/:id",
            get(promotions::get_promotion)
                .put(promotions::update_promotion)
                .delete(promotions::delete_promotion),
        )
        .route("/orders", get(orders::list_orders))
        .route(
            "/orders/:id",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/orders/:id/status", put(orders::update_order_status))
        .route("/orders/:id/cancel", post(orders::cancel_order))
        .route_layer(middleware::from_fn_with_state(auth, admin_auth_middleware))
}

pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(public_routes())
        .nest("/admin", admin_routes(auth))
}

/// Full application router with the shared middleware stack. CORS is left to
/// the caller since it depends on deployment configuration.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "restaurant-api up" }))
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .fallback(route_not_found)
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("Route not found".to_string())),
    )
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "restaurant-api",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<Value>>) {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let code = if db_status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let health_data = json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": Utc::now().to_rfc3339(),
    });

    (code, Json(ApiResponse::success(health_data)))
}
