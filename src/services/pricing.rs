//! Pure order pricing.
//!
//! Everything in this module is a function of its inputs: the requested
//! lines, a snapshot of the catalog and an optional coupon rule. No I/O
//! happens here, which lets the order path price a cart before opening the
//! write transaction and lets the coupon preview endpoint reuse the exact
//! same arithmetic.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::entities::coupon::{self, CouponType};
use crate::errors::ServiceError;

/// Group size for bogo coupons that do not set `buy_x`
pub const DEFAULT_BOGO_GROUP: u32 = 2;

/// Largest quantity accepted on a single order line
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Largest amount the `DECIMAL(10, 2)` money columns can hold
pub const MAX_MONEY_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// A coupon's discount rule, one variant per coupon type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRule {
    /// Percentage off a category once `min_quantity` of its items are ordered
    BuyX {
        category_id: i32,
        min_quantity: u32,
        percent: Decimal,
    },
    Percentage {
        category_id: i32,
        percent: Decimal,
    },
    Fixed {
        category_id: i32,
        amount: Decimal,
    },
    /// The cheapest eligible unit is free for every complete group
    Bogo { category_id: i32, group_size: u32 },
    MinCartAmount { threshold: Decimal, percent: Decimal },
    /// Category percentage; the resolver enforces the window
    DateRange { category_id: i32, percent: Decimal },
}

impl CouponRule {
    pub fn coupon_type(&self) -> CouponType {
        match self {
            CouponRule::BuyX { .. } => CouponType::BuyX,
            CouponRule::Percentage { .. } => CouponType::Percentage,
            CouponRule::Fixed { .. } => CouponType::Fixed,
            CouponRule::Bogo { .. } => CouponType::Bogo,
            CouponRule::MinCartAmount { .. } => CouponType::MinCartAmount,
            CouponRule::DateRange { .. } => CouponType::DateRange,
        }
    }

    /// Category the rule is scoped to, `None` for cart-wide rules
    pub fn category_id(&self) -> Option<i32> {
        match self {
            CouponRule::BuyX { category_id, .. }
            | CouponRule::Percentage { category_id, .. }
            | CouponRule::Fixed { category_id, .. }
            | CouponRule::Bogo { category_id, .. }
            | CouponRule::DateRange { category_id, .. } => Some(*category_id),
            CouponRule::MinCartAmount { .. } => None,
        }
    }
}

fn require_category(model: &coupon::Model) -> Result<i32, ServiceError> {
    model.category_id.ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "{} coupons must be scoped to a category",
            model.coupon_type
        ))
    })
}

fn require_percent(model: &coupon::Model) -> Result<Decimal, ServiceError> {
    if model.discount < Decimal::ZERO || model.discount > Decimal::ONE_HUNDRED {
        return Err(ServiceError::ValidationError(format!(
            "{} coupons take a discount between 0 and 100 percent",
            model.coupon_type
        )));
    }
    Ok(model.discount)
}

fn positive_count(value: i32, what: &str, min: u32) -> Result<u32, ServiceError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v >= min)
        .ok_or_else(|| ServiceError::ValidationError(format!("{what} must be at least {min}")))
}

impl TryFrom<&coupon::Model> for CouponRule {
    type Error = ServiceError;

    fn try_from(model: &coupon::Model) -> Result<Self, Self::Error> {
        let rule = match model.coupon_type {
            CouponType::BuyX => {
                let buy_x = model.buy_x.ok_or_else(|| {
                    ServiceError::ValidationError("buy_x coupons require buy_x".into())
                })?;
                CouponRule::BuyX {
                    category_id: require_category(model)?,
                    min_quantity: positive_count(buy_x, "buy_x", 1)?,
                    percent: require_percent(model)?,
                }
            }
            CouponType::Percentage => CouponRule::Percentage {
                category_id: require_category(model)?,
                percent: require_percent(model)?,
            },
            CouponType::Fixed => {
                if model.discount < Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "fixed coupons take a non-negative amount".into(),
                    ));
                }
                CouponRule::Fixed {
                    category_id: require_category(model)?,
                    amount: model.discount,
                }
            }
            CouponType::Bogo => CouponRule::Bogo {
                category_id: require_category(model)?,
                group_size: match model.buy_x {
                    Some(buy_x) => positive_count(buy_x, "bogo group size", 2)?,
                    None => DEFAULT_BOGO_GROUP,
                },
            },
            CouponType::MinCartAmount => {
                let threshold = model.min_cart_amount.ok_or_else(|| {
                    ServiceError::ValidationError(
                        "min_cart_amount coupons require min_cart_amount".into(),
                    )
                })?;
                if threshold < Decimal::ZERO {
                    return Err(ServiceError::ValidationError(
                        "min_cart_amount must not be negative".into(),
                    ));
                }
                if model.category_id.is_some() {
                    return Err(ServiceError::ValidationError(
                        "min_cart_amount coupons apply to the whole cart and take no category"
                            .into(),
                    ));
                }
                CouponRule::MinCartAmount {
                    threshold,
                    percent: require_percent(model)?,
                }
            }
            CouponType::DateRange => {
                if model.valid_from.is_none() || model.valid_to.is_none() {
                    return Err(ServiceError::ValidationError(
                        "date_range coupons require both valid_from and valid_to".into(),
                    ));
                }
                CouponRule::DateRange {
                    category_id: require_category(model)?,
                    percent: require_percent(model)?,
                }
            }
        };

        if let (Some(from), Some(to)) = (model.valid_from, model.valid_to) {
            if to < from {
                return Err(ServiceError::ValidationError(
                    "valid_to must not be before valid_from".into(),
                ));
            }
        }

        Ok(rule)
    }
}

/// One requested line of a cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: i32,
    pub quantity: u32,
    /// Unit price as shown to the customer; never trusted
    pub client_price: Option<Decimal>,
}

impl OrderLine {
    pub fn new(menu_item_id: i32, quantity: u32) -> Self {
        Self {
            menu_item_id,
            quantity,
            client_price: None,
        }
    }

    pub fn with_client_price(mut self, price: Decimal) -> Self {
        self.client_price = Some(price);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub price: Decimal,
    pub category_id: i32,
}

/// Canonical prices and categories the engine prices against
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    items: HashMap<i32, CatalogEntry>,
    categories: HashMap<i32, String>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&mut self, menu_item_id: i32, price: Decimal, category_id: i32) {
        self.items.insert(menu_item_id, CatalogEntry { price, category_id });
    }

    pub fn insert_category(&mut self, category_id: i32, name: impl Into<String>) {
        self.categories.insert(category_id, name.into());
    }

    pub fn item(&self, menu_item_id: i32) -> Option<&CatalogEntry> {
        self.items.get(&menu_item_id)
    }

    pub fn category_name(&self, category_id: i32) -> String {
        self.categories
            .get(&category_id)
            .cloned()
            .unwrap_or_else(|| format!("category {category_id}"))
    }
}

/// Whether client-supplied unit prices that disagree with the catalog fail
/// the request or are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientPriceCheck {
    #[default]
    Strict,
    Lenient,
}

impl ClientPriceCheck {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ClientPriceCheck::Strict
        } else {
            ClientPriceCheck::Lenient
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PricedLine {
    pub menu_item_id: i32,
    pub category_id: i32,
    pub quantity: u32,
    #[schema(value_type = String, example = "150.00")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "450.00")]
    pub line_total: Decimal,
}

/// Result of pricing a cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PriceQuote {
    pub lines: Vec<PricedLine>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub eligible_subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

fn amount_too_large() -> ServiceError {
    ServiceError::ValidationError(format!(
        "Order amount must not exceed {}",
        MAX_MONEY_AMOUNT
    ))
}

/// Resolves every line against the catalog and returns the priced lines with
/// their subtotal.
pub fn price_lines(
    lines: &[OrderLine],
    catalog: &CatalogSnapshot,
    price_check: ClientPriceCheck,
) -> Result<(Vec<PricedLine>, Decimal), ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::ValidationError(
            "Order must contain at least one item".into(),
        ));
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        if line.quantity == 0 || line.quantity > MAX_LINE_QUANTITY {
            return Err(ServiceError::ValidationError(format!(
                "Quantity for menu item {} must be between 1 and {}",
                line.menu_item_id, MAX_LINE_QUANTITY
            )));
        }

        let entry = catalog.item(line.menu_item_id).ok_or_else(|| {
            ServiceError::InvalidReference(format!("Menu item {} not found", line.menu_item_id))
        })?;

        if let Some(client_price) = line.client_price {
            if client_price != entry.price {
                match price_check {
                    ClientPriceCheck::Strict => {
                        return Err(ServiceError::ValidationError(format!(
                            "Price for menu item {} does not match the menu",
                            line.menu_item_id
                        )));
                    }
                    ClientPriceCheck::Lenient => warn!(
                        menu_item_id = line.menu_item_id,
                        %client_price,
                        menu_price = %entry.price,
                        "ignoring client-supplied price"
                    ),
                }
            }
        }

        let line_total = entry
            .price
            .checked_mul(Decimal::from(line.quantity))
            .ok_or_else(amount_too_large)?;
        subtotal = subtotal.checked_add(line_total).ok_or_else(amount_too_large)?;
        if subtotal > MAX_MONEY_AMOUNT {
            return Err(amount_too_large());
        }
        priced.push(PricedLine {
            menu_item_id: line.menu_item_id,
            category_id: entry.category_id,
            quantity: line.quantity,
            unit_price: entry.price,
            line_total,
        });
    }

    Ok((priced, subtotal))
}

/// Computes `(eligible_subtotal, discount)` for a rule over already priced
/// lines. The discount is rounded to cents and never exceeds the eligible
/// subtotal.
pub fn compute_discount(
    rule: &CouponRule,
    lines: &[PricedLine],
    subtotal: Decimal,
    catalog: &CatalogSnapshot,
) -> Result<(Decimal, Decimal), ServiceError> {
    let (eligible_subtotal, eligible_quantity, cheapest) = match rule.category_id() {
        None => (subtotal, 0, None),
        Some(category_id) => {
            let eligible: Vec<&PricedLine> = lines
                .iter()
                .filter(|line| line.category_id == category_id)
                .collect();
            let eligible_subtotal: Decimal = eligible.iter().map(|l| l.line_total).sum();
            if eligible_subtotal.is_zero() {
                return Err(ServiceError::CategoryMismatch(format!(
                    "Coupon applies only to items from {}",
                    catalog.category_name(category_id)
                )));
            }
            let quantity: u64 = eligible.iter().map(|l| u64::from(l.quantity)).sum();
            let cheapest = eligible.iter().map(|l| l.unit_price).min();
            (eligible_subtotal, quantity, cheapest)
        }
    };

    let raw = match rule {
        CouponRule::BuyX {
            category_id,
            min_quantity,
            percent,
        } => {
            if eligible_quantity < u64::from(*min_quantity) {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "Coupon requires at least {} items from {}",
                    min_quantity,
                    catalog.category_name(*category_id)
                )));
            }
            percent_of(eligible_subtotal, *percent)
        }
        CouponRule::Percentage { percent, .. } | CouponRule::DateRange { percent, .. } => {
            percent_of(eligible_subtotal, *percent)
        }
        CouponRule::Fixed { amount, .. } => (*amount).min(eligible_subtotal),
        CouponRule::Bogo {
            category_id,
            group_size,
        } => {
            let groups = eligible_quantity / u64::from((*group_size).max(1));
            if groups == 0 {
                return Err(ServiceError::InsufficientQuantity(format!(
                    "Coupon requires at least {} items from {}",
                    group_size,
                    catalog.category_name(*category_id)
                )));
            }
            cheapest.unwrap_or(Decimal::ZERO) * Decimal::from(groups)
        }
        CouponRule::MinCartAmount { threshold, percent } => {
            if subtotal < *threshold {
                return Err(ServiceError::InsufficientCartAmount(format!(
                    "Order subtotal must be at least {} to use this coupon",
                    threshold
                )));
            }
            percent_of(eligible_subtotal, *percent)
        }
    };

    let discount = round_money(raw).min(eligible_subtotal).max(Decimal::ZERO);
    Ok((eligible_subtotal, discount))
}

/// Prices a cart, optionally applying a coupon rule.
pub fn price_order(
    lines: &[OrderLine],
    catalog: &CatalogSnapshot,
    rule: Option<&CouponRule>,
    price_check: ClientPriceCheck,
) -> Result<PriceQuote, ServiceError> {
    let (priced, subtotal) = price_lines(lines, catalog, price_check)?;

    let (eligible_subtotal, discount) = match rule {
        Some(rule) => compute_discount(rule, &priced, subtotal, catalog)?,
        None => (Decimal::ZERO, Decimal::ZERO),
    };

    let total = (subtotal - discount).max(Decimal::ZERO);

    Ok(PriceQuote {
        lines: priced,
        subtotal,
        eligible_subtotal,
        discount,
        total,
    })
}
