//! Seed data script - populates an empty database with a starter menu
//!
//! Run with: cargo run --bin seed-data
//!
//! Creates the "Main Course" and "Desserts" categories, a handful of dishes,
//! one top pick and two sample coupons. Tables that already hold rows are
//! left untouched.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Set,
};
use std::time::Duration as StdDuration;
use tracing::info;

use restaurant_api::entities::{category, coupon, coupon::CouponType, menu_item, top_pick};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Restaurant API Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://restaurant.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;
    restaurant_api::db::run_migrations(&db).await?;

    if category::Entity::find().count(&db).await? > 0 {
        info!("Categories already present; nothing to seed");
        return Ok(());
    }

    let (mains, desserts) = create_categories(&db).await?;
    info!("  Created categories");

    let dishes = create_menu_items(&db, mains, desserts).await?;
    info!("  Created {} menu items", dishes.len());

    if let Some(first) = dishes.first() {
        top_pick::ActiveModel {
            menu_item_id: Set(*first),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        info!("  Featured menu item {}", first);
    }

    create_coupons(&db, mains, desserts).await?;
    info!("  Created sample coupons");

    info!("=== Seed Data Complete ===");
    info!("Try: curl http://localhost:8080/api/v1/menu");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_categories(db: &DatabaseConnection) -> anyhow::Result<(i32, i32)> {
    let now = Utc::now();
    let mut ids = Vec::with_capacity(2);
    for name in ["Main Course", "Desserts"] {
        let model = category::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        ids.push(model.id);
    }
    Ok((ids[0], ids[1]))
}

async fn create_menu_items(
    db: &DatabaseConnection,
    mains: i32,
    desserts: i32,
) -> anyhow::Result<Vec<i32>> {
    let dishes: [(&str, &str, Decimal, Option<Decimal>, i32); 5] = [
        ("Paneer Butter Masala", "Cottage cheese in a rich tomato gravy", dec!(220.00), Some(dec!(30.00)), mains),
        ("Chicken Biryani", "Slow-cooked basmati rice with spiced chicken", dec!(260.00), None, mains),
        ("Veg Thali", "Daily selection of curries, rice and bread", dec!(180.00), Some(dec!(20.00)), mains),
        ("Gulab Jamun", "Two warm milk dumplings in syrup", dec!(90.00), None, desserts),
        ("Kulfi", "Pistachio frozen dessert", dec!(110.00), None, desserts),
    ];

    let now = Utc::now();
    let mut ids = Vec::with_capacity(dishes.len());
    for (name, description, price, saved, category_id) in dishes {
        let model = menu_item::ActiveModel {
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(price),
            saved_amount: Set(saved),
            image_url: Set(None),
            category_id: Set(category_id),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        ids.push(model.id);
    }
    Ok(ids)
}

async fn create_coupons(db: &DatabaseConnection, mains: i32, desserts: i32) -> anyhow::Result<()> {
    let now = Utc::now();

    coupon::ActiveModel {
        code: Set("MAINS10".to_string()),
        description: Set(Some("10% off main courses when you order two".to_string())),
        image_url: Set(None),
        discount: Set(dec!(10)),
        coupon_type: Set(CouponType::BuyX),
        category_id: Set(Some(mains)),
        buy_x: Set(Some(2)),
        min_cart_amount: Set(None),
        valid_from: Set(None),
        valid_to: Set(None),
        quantity: Set(Some(100)),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    coupon::ActiveModel {
        code: Set("SWEETWEEK".to_string()),
        description: Set(Some("20% off desserts this week".to_string())),
        image_url: Set(None),
        discount: Set(dec!(20)),
        coupon_type: Set(CouponType::DateRange),
        category_id: Set(Some(desserts)),
        buy_x: Set(None),
        min_cart_amount: Set(None),
        valid_from: Set(Some(now)),
        valid_to: Set(Some(now + Duration::days(7))),
        quantity: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}
