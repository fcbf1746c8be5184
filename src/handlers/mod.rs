pub mod categories;
pub mod common;
pub mod coupons;
pub mod menu;
pub mod orders;
pub mod promotions;
pub mod top_picks;

use crate::{
    config::AppConfig,
    db::DbPool,
    middleware_helpers::retry::RetryConfig,
    services::{
        catalog::CatalogService, coupons::CouponService, orders::OrderService,
        pricing::ClientPriceCheck, promotions::PromotionService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
    pub promotions: Arc<PromotionService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        let catalog = CatalogService::new(db_pool.clone());
        let coupons = CouponService::new(db_pool.clone());
        let orders = OrderService::new(
            db_pool.clone(),
            catalog.clone(),
            coupons.clone(),
            ClientPriceCheck::from_strict(config.strict_client_prices),
            RetryConfig::with_max_attempts(config.order_retry_attempts),
        );
        let promotions = PromotionService::new(db_pool);

        Self {
            catalog: Arc::new(catalog),
            coupons: Arc::new(coupons),
            orders: Arc::new(orders),
            promotions: Arc::new(promotions),
        }
    }
}
