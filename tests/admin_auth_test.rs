mod common;

use axum::http::{Method, StatusCode};
use chrono::Duration;
use rstest::rstest;

use common::{expect_status, read_json, TestApp};

#[rstest]
#[case("/api/v1/admin/menu")]
#[case("/api/v1/admin/coupons")]
#[case("/api/v1/admin/orders")]
#[case("/api/v1/admin/promotions")]
#[case("/api/v1/admin/top-picks")]
#[tokio::test]
async fn admin_routes_require_a_token(#[case] uri: &str) {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, uri, None).await;
    let body = expect_status(response, StatusCode::UNAUTHORIZED).await;

    assert_eq!(body["code"], "AUTH_MISSING_TOKEN");
}

#[tokio::test]
async fn admin_token_grants_access() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/admin/orders", None)
        .await;
    let body = expect_status(response, StatusCode::OK).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn token_cookie_is_accepted() {
    let app = TestApp::new().await;
    let token = app.admin_token().to_string();

    let response = app
        .request_with_cookie(Method::GET, "/api/v1/admin/coupons", &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_admin_role_is_forbidden() {
    let app = TestApp::new().await;
    let token = TestApp::token_for(&app.state.config, &["staff"], Duration::hours(1));

    let response = app
        .request_with_token(Method::GET, "/api/v1/admin/orders", None, &token)
        .await;
    let body = expect_status(response, StatusCode::FORBIDDEN).await;

    assert_eq!(body["code"], "AUTH_INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::new().await;
    let token = TestApp::token_for(&app.state.config, &["admin"], Duration::hours(-2));

    let response = app
        .request_with_token(Method::GET, "/api/v1/admin/orders", None, &token)
        .await;
    let body = expect_status(response, StatusCode::UNAUTHORIZED).await;

    assert_eq!(body["code"], "AUTH_TOKEN_EXPIRED");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = TestApp::new().await;
    let mut other = app.state.config.clone();
    other.jwt_secret = "a_completely_different_secret_value_0123456789".to_string();
    let token = TestApp::token_for(&other, &["admin"], Duration::hours(1));

    let response = app
        .request_with_token(Method::GET, "/api/v1/admin/orders", None, &token)
        .await;
    let body = expect_status(response, StatusCode::UNAUTHORIZED).await;

    assert_eq!(body["code"], "AUTH_INVALID_TOKEN");
}

#[tokio::test]
async fn public_routes_need_no_token() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/menu",
        "/api/v1/categories",
        "/api/v1/top-picks",
        "/api/v1/coupons",
        "/api/v1/promotions",
    ] {
        let response = app.request(Method::GET, uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn responses_echo_the_request_id() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/admin/orders", None).await;
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let body = read_json(response).await;

    assert_eq!(body["request_id"], header.as_str());
}

#[tokio::test]
async fn health_reports_database_status() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    let body = expect_status(response, StatusCode::OK).await;

    assert_eq!(body["data"]["checks"]["database"], "healthy");
}
