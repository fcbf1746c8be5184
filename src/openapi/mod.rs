use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Restaurant API",
        version = "1.0.0",
        description = r#"
# Restaurant Ordering API

Menu browsing and order placement for diners, and a management surface for staff.

## Coupons

Orders may carry one coupon code. Codes are matched case-insensitively. Supported
rules: `buy_x`, `percentage`, `fixed`, `bogo`, `min_cart_amount` and `date_range`.
Prices are always taken from the menu; a client-supplied price is only checked.

## Authentication

Routes under `/api/v1/admin` require a JWT carrying the `admin` role, sent either as

```
Authorization: Bearer <token>
```

or in the `token` cookie.

## Error Handling

Errors share one body shape:

```json
{
  "error": "Conflict",
  "code": "COUPON_EXHAUSTED",
  "message": "SAVE10 has no uses left",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Menu", description = "Menu, categories and featured items"),
        (name = "Coupons", description = "Redeemable coupons and cart previews"),
        (name = "Promotions", description = "Running promotions"),
        (name = "Orders", description = "Order placement"),
        (name = "Admin", description = "Administrative endpoints")
    ),
    paths(
        // Public
        crate::handlers::menu::list_menu,
        crate::handlers::menu::get_menu_item,
        crate::handlers::categories::list_categories,
        crate::handlers::top_picks::list_top_picks,
        crate::handlers::coupons::list_active_coupons,
        crate::handlers::coupons::preview_coupon,
        crate::handlers::promotions::list_running_promotions,
        crate::handlers::orders::place_order,

        // Admin catalog
        crate::handlers::menu::admin_list_menu,
        crate::handlers::menu::create_menu_item,
        crate::handlers::menu::update_menu_item,
        crate::handlers::menu::delete_menu_item,
        crate::handlers::categories::create_category,
        crate::handlers::categories::rename_category,
        crate::handlers::categories::delete_category,
        crate::handlers::top_picks::admin_list_top_picks,
        crate::handlers::top_picks::add_top_pick,
        crate::handlers::top_picks::remove_top_pick,

        // Admin coupons and promotions
        crate::handlers::coupons::list_coupons,
        crate::handlers::coupons::get_coupon,
        crate::handlers::coupons::create_coupon,
        crate::handlers::coupons::update_coupon,
        crate::handlers::coupons::delete_coupon,
        crate::handlers::promotions::list_promotions,
        crate::handlers::promotions::get_promotion,
        crate::handlers::promotions::create_promotion,
        crate::handlers::promotions::update_promotion,
        crate::handlers::promotions::delete_promotion,

        // Admin orders
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::delete_order,
    ),
    components(
        schemas(
            crate::ResponseMeta,
            crate::entities::coupon::CouponType,
            crate::entities::order::OrderStatus,
            crate::services::pricing::PricedLine,
            crate::services::pricing::PriceQuote,
            crate::services::catalog::CategoryResponse,
            crate::services::catalog::MenuItemResponse,
            crate::services::catalog::TopPickResponse,
            crate::services::coupons::CouponResponse,
            crate::services::promotions::PromotionResponse,
            crate::services::orders::OrderItemRequest,
            crate::services::orders::OrderSummary,
            crate::services::orders::OrderLineView,
            crate::services::orders::OrderDetails,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDocV1;

/// Registers the admin bearer scheme referenced by `security(("Bearer" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Serialized OpenAPI document, as served at `/api-docs/openapi.json`
pub fn document_json(pretty: bool) -> serde_json::Result<String> {
    let openapi = ApiDocV1::openapi();
    if pretty {
        serde_json::to_string_pretty(&openapi)
    } else {
        serde_json::to_string(&openapi)
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_public_and_admin_paths() {
        let json = document_json(true).unwrap();
        assert!(json.contains("Restaurant API"));
        assert!(json.contains("/api/v1/orders"));
        assert!(json.contains("/api/v1/coupons/validate"));
        assert!(json.contains("/api/v1/admin/orders/{id}/status"));
        assert!(json.contains("\"Bearer\""));
    }

    #[test]
    fn compact_document_is_one_line_with_the_same_content() {
        let compact = document_json(false).unwrap();
        let pretty = document_json(true).unwrap();
        assert!(!compact.contains('\n'));

        let compact: serde_json::Value = serde_json::from_str(&compact).unwrap();
        let pretty: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(compact, pretty);
    }
}
