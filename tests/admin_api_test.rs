mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

use common::{decimal, expect_status, CouponSeed, TestApp};
use restaurant_api::entities::{coupon::CouponType, order};

async fn place(app: &TestApp, menu_item_id: i32, table_number: i32) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_name": "Guest",
                "table_number": table_number,
                "items": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
            })),
        )
        .await;
    let body = expect_status(response, StatusCode::CREATED).await;
    body["data"]["order_id"].as_i64().expect("order id")
}

#[tokio::test]
async fn category_lifecycle() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/categories",
            Some(json!({ "name": "  Starters " })),
        )
        .await;
    let body = expect_status(response, StatusCode::CREATED).await;
    assert_eq!(body["data"]["name"], "Starters");
    let id = body["data"]["id"].as_i64().expect("category id");

    let duplicate = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/categories",
            Some(json!({ "name": "Starters" })),
        )
        .await;
    expect_status(duplicate, StatusCode::CONFLICT).await;

    let renamed = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/admin/categories/{id}"),
            Some(json!({ "name": "Small Plates" })),
        )
        .await;
    let body = expect_status(renamed, StatusCode::OK).await;
    assert_eq!(body["data"]["name"], "Small Plates");

    let listed = app.request(Method::GET, "/api/v1/categories", None).await;
    let body = expect_status(listed, StatusCode::OK).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let deleted = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/admin/categories/{id}"),
            None,
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/admin/categories/{id}"),
            None,
        )
        .await;
    expect_status(missing, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let app = TestApp::new().await;
    let mains = app.seed_category("Main Course").await;
    app.seed_menu_item("Thali", dec!(100.00), mains).await;

    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/admin/categories/{mains}"),
            None,
        )
        .await;
    let body = expect_status(response, StatusCode::CONFLICT).await;
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn menu_item_lifecycle() {
    let app = TestApp::new().await;
    let mains = app.seed_category("Main Course").await;

    let unknown_category = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/menu",
            Some(json!({ "name": "Ghost", "price": "10.00", "category_id": 999 })),
        )
        .await;
    let body = expect_status(unknown_category, StatusCode::UNPROCESSABLE_ENTITY).await;
    assert_eq!(body["code"], "INVALID_REFERENCE");

    let negative = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/menu",
            Some(json!({ "name": "Refund", "price": "-1.00", "category_id": mains })),
        )
        .await;
    expect_status(negative, StatusCode::BAD_REQUEST).await;

    let too_expensive = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/menu",
            Some(json!({ "name": "Gold Leaf", "price": "100000000.00", "category_id": mains })),
        )
        .await;
    expect_status(too_expensive, StatusCode::BAD_REQUEST).await;

    let created = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/menu",
            Some(json!({
                "name": "Paneer Tikka",
                "description": "Chargrilled cottage cheese",
                "price": "240.00",
                "saved_amount": "20.00",
                "category_id": mains
            })),
        )
        .await;
    let body = expect_status(created, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_i64().expect("menu item id");
    assert_eq!(body["data"]["category"], "Main Course");
    assert_eq!(body["data"]["is_top_pick"], false);

    let updated = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/admin/menu/{id}"),
            Some(json!({ "price": "250.00" })),
        )
        .await;
    let body = expect_status(updated, StatusCode::OK).await;
    assert_eq!(decimal(&body["data"]["price"]), dec!(250));
    assert_eq!(body["data"]["name"], "Paneer Tikka");

    let fetched = app
        .request(Method::GET, &format!("/api/v1/menu/{id}"), None)
        .await;
    let body = expect_status(fetched, StatusCode::OK).await;
    assert_eq!(body["data"]["description"], "Chargrilled cottage cheese");

    let deleted = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/admin/menu/{id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app
        .request(Method::GET, &format!("/api/v1/menu/{id}"), None)
        .await;
    expect_status(gone, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn ordered_menu_item_cannot_be_deleted() {
    let app = TestApp::new().await;
    let mains = app.seed_category("Main Course").await;
    let dish = app.seed_menu_item("Thali", dec!(100.00), mains).await;
    place(&app, dish, 3).await;

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/admin/menu/{dish}"), None)
        .await;
    expect_status(response, StatusCode::CONFLICT).await;
}

#[tokio::test]
async fn top_picks_are_featured_once() {
    let app = TestApp::new().await;
    let mains = app.seed_category("Main Course").await;
    let dish = app.seed_menu_item("Thali", dec!(100.00), mains).await;

    let added = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/top-picks",
            Some(json!({ "menu_item_id": dish })),
        )
        .await;
    let body = expect_status(added, StatusCode::CREATED).await;
    let pick_id = body["data"]["id"].as_i64().expect("top pick id");
    assert_eq!(body["data"]["menu_item"]["name"], "Thali");

    let again = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/top-picks",
            Some(json!({ "menu_item_id": dish })),
        )
        .await;
    expect_status(again, StatusCode::CONFLICT).await;

    let unknown = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/top-picks",
            Some(json!({ "menu_item_id": 777 })),
        )
        .await;
    expect_status(unknown, StatusCode::UNPROCESSABLE_ENTITY).await;

    let menu = app.request(Method::GET, "/api/v1/menu", None).await;
    let body = expect_status(menu, StatusCode::OK).await;
    assert_eq!(body["data"][0]["is_top_pick"], true);

    let removed = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/admin/top-picks/{pick_id}"),
            None,
        )
        .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let public = app.request(Method::GET, "/api/v1/top-picks", None).await;
    let body = expect_status(public, StatusCode::OK).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn coupon_management() {
    let app = TestApp::new().await;
    let desserts = app.seed_category("Desserts").await;

    let created = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(json!({
                "code": "sweet2",
                "discount": "0",
                "coupon_type": "bogo",
                "category_id": desserts,
                "buy_x": 2,
                "quantity": 10
            })),
        )
        .await;
    let body = expect_status(created, StatusCode::CREATED).await;
    assert_eq!(body["data"]["code"], "SWEET2");
    let id = body["data"]["id"].as_i64().expect("coupon id");

    let duplicate = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(json!({
                "code": "SWEET2",
                "discount": "10",
                "coupon_type": "percentage",
                "category_id": desserts
            })),
        )
        .await;
    expect_status(duplicate, StatusCode::CONFLICT).await;

    let bad_bogo = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(json!({
                "code": "ONEFREE",
                "discount": "0",
                "coupon_type": "bogo",
                "category_id": desserts,
                "buy_x": 1
            })),
        )
        .await;
    expect_status(bad_bogo, StatusCode::BAD_REQUEST).await;

    let missing_threshold = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(json!({
                "code": "BIGSPENDER",
                "discount": "10",
                "coupon_type": "min_cart_amount"
            })),
        )
        .await;
    expect_status(missing_threshold, StatusCode::BAD_REQUEST).await;

    let backwards_window = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(json!({
                "code": "TIMETRAVEL",
                "discount": "10",
                "coupon_type": "date_range",
                "category_id": desserts,
                "valid_from": Utc::now().to_rfc3339(),
                "valid_to": (Utc::now() - Duration::days(1)).to_rfc3339()
            })),
        )
        .await;
    expect_status(backwards_window, StatusCode::BAD_REQUEST).await;

    let updated = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/admin/coupons/{id}"),
            Some(json!({ "quantity": 3, "description": "Second dessert free" })),
        )
        .await;
    let body = expect_status(updated, StatusCode::OK).await;
    assert_eq!(body["data"]["quantity"], 3);
    assert_eq!(body["data"]["coupon_type"], "bogo");

    let fetched = app
        .request_authenticated(Method::GET, &format!("/api/v1/admin/coupons/{id}"), None)
        .await;
    let body = expect_status(fetched, StatusCode::OK).await;
    assert_eq!(body["data"]["description"], "Second dessert free");

    let deleted = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/admin/coupons/{id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn public_coupon_list_hides_unusable_coupons() {
    let app = TestApp::new().await;
    let mains = app.seed_category("Main Course").await;
    app.seed_coupon(CouponSeed {
        category_id: Some(mains),
        ..CouponSeed::new("LIVE", CouponType::Percentage, dec!(10))
    })
    .await;
    app.seed_coupon(CouponSeed {
        category_id: Some(mains),
        quantity: Some(0),
        ..CouponSeed::new("EMPTY", CouponType::Percentage, dec!(10))
    })
    .await;
    app.seed_coupon(CouponSeed {
        category_id: Some(mains),
        valid_from: Some(Utc::now() + Duration::days(1)),
        valid_to: Some(Utc::now() + Duration::days(5)),
        ..CouponSeed::new("SOON", CouponType::DateRange, dec!(10))
    })
    .await;
    app.seed_coupon(CouponSeed {
        category_id: Some(mains),
        is_active: false,
        ..CouponSeed::new("OFF", CouponType::Percentage, dec!(10))
    })
    .await;

    let response = app.request(Method::GET, "/api/v1/coupons", None).await;
    let body = expect_status(response, StatusCode::OK).await;
    let codes: Vec<&str> = body["data"]
        .as_array()
        .expect("coupon list")
        .iter()
        .filter_map(|c| c["code"].as_str())
        .collect();
    assert_eq!(codes, vec!["LIVE"]);

    let admin = app
        .request_authenticated(Method::GET, "/api/v1/admin/coupons", None)
        .await;
    let body = expect_status(admin, StatusCode::OK).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn order_book_lists_filters_and_transitions() {
    let app = TestApp::new().await;
    let mains = app.seed_category("Main Course").await;
    let dish = app.seed_menu_item("Thali", dec!(100.00), mains).await;
    let first = place(&app, dish, 1).await;
    let second = place(&app, dish, 2).await;
    let third = place(&app, dish, 3).await;

    let page = app
        .request_authenticated(Method::GET, "/api/v1/admin/orders?page=1&limit=2", None)
        .await;
    let body = expect_status(page, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"][0]["id"], third);

    let preparing = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/admin/orders/{first}/status"),
            Some(json!({ "status": "Confirmed" })),
        )
        .await;
    let body = expect_status(preparing, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "Preparing");

    let delivered = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/admin/orders/{first}"),
            Some(json!({ "status": "Delivered", "special_instructions": "Left at table" })),
        )
        .await;
    let body = expect_status(delivered, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "Delivered");
    assert_eq!(body["data"]["special_instructions"], "Left at table");

    let reopen = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/admin/orders/{first}/cancel"),
            None,
        )
        .await;
    let body = expect_status(reopen, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["code"], "INVALID_OPERATION");

    let cancelled = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/admin/orders/{second}/cancel"),
            None,
        )
        .await;
    let body = expect_status(cancelled, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], "Cancelled");

    let filtered = app
        .request_authenticated(Method::GET, "/api/v1/admin/orders?status=pending", None)
        .await;
    let body = expect_status(filtered, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], third);

    let bogus = app
        .request_authenticated(Method::GET, "/api/v1/admin/orders?status=lost", None)
        .await;
    expect_status(bogus, StatusCode::BAD_REQUEST).await;

    let detail = app
        .request_authenticated(Method::GET, &format!("/api/v1/admin/orders/{third}"), None)
        .await;
    let body = expect_status(detail, StatusCode::OK).await;
    assert_eq!(body["data"]["items"][0]["name"], "Thali");
    assert_eq!(body["data"]["items"][0]["quantity"], 1);

    let deleted = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/admin/orders/{third}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app
        .request_authenticated(Method::GET, &format!("/api/v1/admin/orders/{third}"), None)
        .await;
    expect_status(gone, StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn legacy_orders_read_items_from_json_column() {
    let app = TestApp::new().await;
    let now = Utc::now();
    let legacy = order::ActiveModel {
        customer_name: Set("Legacy Guest".to_string()),
        table_number: Set(12),
        coupon_code: Set(None),
        subtotal: Set(dec!(300)),
        discount: Set(dec!(0)),
        total: Set(dec!(300)),
        special_instructions: Set(None),
        status: Set(order::OrderStatus::Delivered),
        items_json: Set(Some(json!([
            { "_id": 5, "name": "Samosa", "quantity": 2, "price": "50.00" },
            { "id": 6, "name": "Lassi", "price_at_order": "200.00" }
        ]))),
        created_at: Set(now),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(&*app.state.db)
    .await
    .expect("insert legacy order");

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/admin/orders/{}", legacy.id),
            None,
        )
        .await;
    let body = expect_status(response, StatusCode::OK).await;

    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["menu_item_id"], 5);
    assert_eq!(decimal(&items[0]["line_total"]), dec!(100));
    assert_eq!(items[1]["name"], "Lassi");
    assert_eq!(items[1]["quantity"], 1);
}

#[tokio::test]
async fn promotions_management_and_public_listing() {
    let app = TestApp::new().await;
    let now = Utc::now();

    let backwards = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/promotions",
            Some(json!({
                "title": "Broken",
                "start_date": now.to_rfc3339(),
                "end_date": (now - Duration::hours(1)).to_rfc3339()
            })),
        )
        .await;
    expect_status(backwards, StatusCode::BAD_REQUEST).await;

    let running = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/promotions",
            Some(json!({
                "title": "Monsoon Specials",
                "start_date": (now - Duration::days(1)).to_rfc3339(),
                "end_date": (now + Duration::days(6)).to_rfc3339()
            })),
        )
        .await;
    let body = expect_status(running, StatusCode::CREATED).await;
    assert_eq!(body["data"]["is_running"], true);
    let running_id = body["data"]["id"].as_i64().expect("promotion id");

    let upcoming = app
        .request_authenticated(
            Method::POST,
            "/api/v1/admin/promotions",
            Some(json!({
                "title": "Diwali Week",
                "start_date": (now + Duration::days(30)).to_rfc3339(),
                "end_date": (now + Duration::days(37)).to_rfc3339()
            })),
        )
        .await;
    let body = expect_status(upcoming, StatusCode::CREATED).await;
    let upcoming_id = body["data"]["id"].as_i64().expect("promotion id");

    let public = app.request(Method::GET, "/api/v1/promotions", None).await;
    let body = expect_status(public, StatusCode::OK).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .expect("promotions")
        .iter()
        .filter_map(|p| p["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Monsoon Specials"]);

    let shrink = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/admin/promotions/{upcoming_id}"),
            Some(json!({ "end_date": (now + Duration::days(1)).to_rfc3339() })),
        )
        .await;
    expect_status(shrink, StatusCode::BAD_REQUEST).await;

    let renamed = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/admin/promotions/{running_id}"),
            Some(json!({ "title": "Monsoon Menu" })),
        )
        .await;
    let body = expect_status(renamed, StatusCode::OK).await;
    assert_eq!(body["data"]["title"], "Monsoon Menu");

    let deleted = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/admin/promotions/{running_id}"),
            None,
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let all = app
        .request_authenticated(Method::GET, "/api/v1/admin/promotions", None)
        .await;
    let body = expect_status(all, StatusCode::OK).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}
