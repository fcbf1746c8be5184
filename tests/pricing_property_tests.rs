//! Property-based tests for order pricing.
//!
//! The catalog and carts are generated; the invariants must hold for every
//! coupon rule the pricing engine accepts.

use proptest::prelude::*;
use rust_decimal::Decimal;

use restaurant_api::services::pricing::{
    price_order, CatalogSnapshot, ClientPriceCheck, CouponRule, OrderLine,
};

const MAINS: i32 = 1;
const DESSERTS: i32 = 2;
const ITEM_COUNT: i32 = 6;

fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..50_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Six menu items; odd ids are mains, even ids are desserts
fn catalog_strategy() -> impl Strategy<Value = CatalogSnapshot> {
    prop::collection::vec(price_strategy(), ITEM_COUNT as usize).prop_map(|prices| {
        let mut catalog = CatalogSnapshot::new();
        catalog.insert_category(MAINS, "Main Course");
        catalog.insert_category(DESSERTS, "Desserts");
        for (idx, price) in prices.into_iter().enumerate() {
            let id = idx as i32 + 1;
            let category = if id % 2 == 1 { MAINS } else { DESSERTS };
            catalog.insert_item(id, price, category);
        }
        catalog
    })
}

fn cart_strategy() -> impl Strategy<Value = Vec<OrderLine>> {
    prop::collection::vec(
        (1..=ITEM_COUNT, 1u32..20, prop::option::of(price_strategy())),
        1..8,
    )
    .prop_map(|lines| {
        lines
            .into_iter()
            .map(|(id, quantity, client_price)| OrderLine {
                menu_item_id: id,
                quantity,
                client_price,
            })
            .collect()
    })
}

fn percent_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|basis| Decimal::new(basis, 2))
}

fn rule_strategy() -> impl Strategy<Value = CouponRule> {
    let category = prop_oneof![Just(MAINS), Just(DESSERTS)];
    prop_oneof![
        (category.clone(), 1u32..4, percent_strategy()).prop_map(|(category_id, min_quantity, percent)| {
            CouponRule::BuyX {
                category_id,
                min_quantity,
                percent,
            }
        }),
        (category.clone(), percent_strategy())
            .prop_map(|(category_id, percent)| CouponRule::Percentage { category_id, percent }),
        (category.clone(), price_strategy())
            .prop_map(|(category_id, amount)| CouponRule::Fixed { category_id, amount }),
        (category.clone(), 2u32..4)
            .prop_map(|(category_id, group_size)| CouponRule::Bogo { category_id, group_size }),
        (price_strategy(), percent_strategy())
            .prop_map(|(threshold, percent)| CouponRule::MinCartAmount { threshold, percent }),
        (category, percent_strategy())
            .prop_map(|(category_id, percent)| CouponRule::DateRange { category_id, percent }),
    ]
}

fn expected_subtotal(lines: &[OrderLine], catalog: &CatalogSnapshot) -> Decimal {
    lines
        .iter()
        .filter_map(|line| {
            catalog
                .item(line.menu_item_id)
                .map(|entry| entry.price * Decimal::from(line.quantity))
        })
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn subtotal_ignores_client_prices(catalog in catalog_strategy(), cart in cart_strategy()) {
        let quote = price_order(&cart, &catalog, None, ClientPriceCheck::Lenient)
            .expect("lenient pricing without a coupon always succeeds");

        prop_assert_eq!(quote.subtotal, expected_subtotal(&cart, &catalog));
        prop_assert_eq!(quote.discount, Decimal::ZERO);
        prop_assert_eq!(quote.total, quote.subtotal);
        for line in &quote.lines {
            let entry = catalog.item(line.menu_item_id).expect("priced line is in catalog");
            prop_assert_eq!(line.unit_price, entry.price);
        }
    }

    #[test]
    fn total_is_never_negative(
        catalog in catalog_strategy(),
        cart in cart_strategy(),
        rule in rule_strategy(),
    ) {
        // Rules whose preconditions the cart misses are rejected; that's fine here
        if let Ok(quote) = price_order(&cart, &catalog, Some(&rule), ClientPriceCheck::Lenient) {
            prop_assert!(quote.discount >= Decimal::ZERO);
            prop_assert!(quote.discount <= quote.eligible_subtotal);
            prop_assert!(quote.total >= Decimal::ZERO);
            prop_assert_eq!(quote.total, (quote.subtotal - quote.discount).max(Decimal::ZERO));
        }
    }

    #[test]
    fn fixed_discount_is_capped_by_eligible_items(
        catalog in catalog_strategy(),
        cart in cart_strategy(),
        category_id in prop_oneof![Just(MAINS), Just(DESSERTS)],
        amount in price_strategy(),
    ) {
        let rule = CouponRule::Fixed { category_id, amount };
        if let Ok(quote) = price_order(&cart, &catalog, Some(&rule), ClientPriceCheck::Lenient) {
            let eligible: Decimal = quote
                .lines
                .iter()
                .filter(|line| line.category_id == category_id)
                .map(|line| line.line_total)
                .sum();
            prop_assert_eq!(quote.eligible_subtotal, eligible);
            prop_assert_eq!(quote.discount, amount.min(eligible));
        }
    }

    #[test]
    fn strict_mode_accepts_matching_prices(catalog in catalog_strategy(), cart in cart_strategy()) {
        let honest: Vec<OrderLine> = cart
            .into_iter()
            .map(|line| {
                let price = catalog.item(line.menu_item_id).expect("generated id").price;
                OrderLine::new(line.menu_item_id, line.quantity).with_client_price(price)
            })
            .collect();

        let quote = price_order(&honest, &catalog, None, ClientPriceCheck::Strict);
        prop_assert!(quote.is_ok());
    }
}
