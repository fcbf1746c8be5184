use crate::{
    db::{in_transaction, DbPool},
    entities::{
        coupon,
        menu_item,
        order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
    },
    errors::ServiceError,
    middleware_helpers::retry::{with_retry, RetryConfig, TransientRetryPolicy},
    services::{
        catalog::CatalogService,
        coupons::{CouponService, ResolvedCoupon},
        not_blank,
        pricing::{self, ClientPriceCheck, CouponRule, OrderLine, PriceQuote, MAX_LINE_QUANTITY},
    },
};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// One requested line of a customer order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderItemRequest {
    pub menu_item_id: i32,
    #[schema(minimum = 1, maximum = 999)]
    pub quantity: i32,
    /// Unit price the customer saw; checked against the menu, never charged
    #[serde(default, alias = "unit_price")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PlaceOrderRequest {
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub customer_name: String,
    #[validate(range(min = 1, max = 999))]
    pub table_number: i32,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
    pub coupon_code: Option<String>,
    #[validate(length(max = 500))]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub order_id: i32,
    #[schema(value_type = String, example = "450.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "45.00")]
    pub discount: Decimal,
    #[schema(value_type = String, example = "405.00")]
    pub total: Decimal,
}

/// Coupon check against a cart without placing the order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CouponPreviewRequest {
    #[validate(length(min = 1, max = 64))]
    pub coupon_code: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CouponPreviewResponse {
    pub code: String,
    pub coupon_type: coupon::CouponType,
    pub category_id: Option<i32>,
    pub quote: PriceQuote,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineView {
    pub menu_item_id: Option<i32>,
    pub name: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price_at_order: Decimal,
    #[schema(value_type = String)]
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub customer_name: String,
    pub table_number: i32,
    pub coupon_code: Option<String>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub special_instructions: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<order::Model> for OrderSummary {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            customer_name: model.customer_name,
            table_number: model.table_number,
            coupon_code: model.coupon_code,
            subtotal: model.subtotal,
            discount: model.discount,
            total: model.total,
            special_instructions: model.special_instructions,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: OrderSummary,
    pub items: Vec<OrderLineView>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderRequest {
    /// Pending, Preparing (or Confirmed), Delivered, Cancelled
    #[schema(example = "Preparing")]
    pub status: Option<String>,
    #[validate(length(max = 500))]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderStatusRequest {
    #[validate(length(min = 1))]
    #[schema(example = "Delivered")]
    pub status: String,
}

/// Parses a status name, accepting `Confirmed` and `Canceled` spellings
pub fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(raw.trim())
        .map_err(|_| ServiceError::ValidationError(format!("Unknown order status: {raw}")))
}

/// Coupon data the write transaction needs
#[derive(Debug, Clone)]
pub struct AppliedCoupon {
    pub id: i32,
    pub code: String,
    pub limited: bool,
}

impl From<&ResolvedCoupon> for AppliedCoupon {
    fn from(resolved: &ResolvedCoupon) -> Self {
        Self {
            id: resolved.model.id,
            code: resolved.model.code.clone(),
            limited: resolved.is_limited(),
        }
    }
}

/// A fully priced order ready to be written
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_name: String,
    pub table_number: i32,
    pub special_instructions: Option<String>,
    pub coupon: Option<AppliedCoupon>,
    pub quote: PriceQuote,
}

/// Entries in the legacy `items_json` column
#[derive(Debug, Deserialize)]
struct LegacyItem {
    #[serde(default, alias = "id", alias = "_id")]
    menu_item_id: Option<i32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_legacy_quantity")]
    quantity: i32,
    #[serde(default, alias = "price_at_order")]
    price: Decimal,
}

fn default_legacy_quantity() -> i32 {
    1
}

fn legacy_lines(raw: &serde_json::Value) -> Vec<OrderLineView> {
    let parsed = match raw {
        serde_json::Value::String(text) => serde_json::from_str::<Vec<LegacyItem>>(text),
        other => serde_json::from_value::<Vec<LegacyItem>>(other.clone()),
    };
    match parsed {
        Ok(items) => items
            .into_iter()
            .map(|item| OrderLineView {
                menu_item_id: item.menu_item_id,
                name: item.name,
                quantity: item.quantity,
                price_at_order: item.price,
                line_total: item.price * Decimal::from(item.quantity),
            })
            .collect(),
        Err(err) => {
            warn!(error = %err, "unreadable legacy order items");
            Vec::new()
        }
    }
}

fn to_order_lines(items: &[OrderItemRequest]) -> Result<Vec<OrderLine>, ServiceError> {
    items
        .iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Quantity for menu item {} must be between 1 and {}",
                        item.menu_item_id, MAX_LINE_QUANTITY
                    ))
                })?;
            let mut line = OrderLine::new(item.menu_item_id, quantity);
            line.client_price = item.price;
            Ok(line)
        })
        .collect()
}

fn i32_quantity(quantity: u32) -> Result<i32, ServiceError> {
    i32::try_from(quantity)
        .map_err(|_| ServiceError::ValidationError(format!("Quantity {quantity} is too large")))
}

/// Order placement and the admin order book
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    catalog: CatalogService,
    coupons: CouponService,
    price_check: ClientPriceCheck,
    retry: RetryConfig,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        catalog: CatalogService,
        coupons: CouponService,
        price_check: ClientPriceCheck,
        retry: RetryConfig,
    ) -> Self {
        Self {
            db_pool,
            catalog,
            coupons,
            price_check,
            retry,
        }
    }

    /// Resolves the coupon, if any, and prices the cart. Nothing is written.
    async fn quote(
        &self,
        items: &[OrderItemRequest],
        coupon_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(PriceQuote, Option<ResolvedCoupon>), ServiceError> {
        let lines = to_order_lines(items)?;

        let resolved = match coupon_code {
            Some(code) => Some(self.coupons.resolve(code, now).await?),
            None => None,
        };

        let ids: Vec<i32> = lines.iter().map(|l| l.menu_item_id).collect();
        let rule: Option<&CouponRule> = resolved.as_ref().map(|c| &c.rule);
        let snapshot = self
            .catalog
            .snapshot_for(&ids, rule.and_then(CouponRule::category_id))
            .await?;
        let quote = pricing::price_order(&lines, &snapshot, rule, self.price_check)?;

        Ok((quote, resolved))
    }

    /// Prices a cart against a coupon for display, without persisting.
    #[instrument(skip(self, request), fields(code = %request.coupon_code))]
    pub async fn preview_coupon(
        &self,
        request: CouponPreviewRequest,
        now: DateTime<Utc>,
    ) -> Result<CouponPreviewResponse, ServiceError> {
        request.validate()?;
        let (quote, resolved) = self
            .quote(&request.items, Some(request.coupon_code.as_str()), now)
            .await?;
        let resolved = resolved.ok_or_else(|| {
            ServiceError::InternalError("coupon resolved to nothing".into())
        })?;

        Ok(CouponPreviewResponse {
            code: resolved.model.code,
            coupon_type: resolved.rule.coupon_type(),
            category_id: resolved.rule.category_id(),
            quote,
        })
    }

    /// Places an order: prices it against the live menu, applies the coupon
    /// and writes header, lines and the coupon decrement in one transaction.
    /// Transient storage failures retry the whole operation.
    #[instrument(skip(self, request), fields(table = request.table_number, coupon = ?request.coupon_code))]
    pub async fn place_order(
        &self,
        request: PlaceOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<PlaceOrderResponse, ServiceError> {
        request.validate()?;
        let start = Instant::now();
        let request = &request;

        let result = with_retry(&self.retry, TransientRetryPolicy, move || {
            self.place_order_once(request, now)
        })
        .await;

        histogram!("restaurant.orders.place.duration", start.elapsed());
        match &result {
            Ok(placed) => {
                counter!("restaurant.orders.placed", 1);
                info!(order_id = placed.order_id, total = %placed.total, "order placed");
            }
            Err(err) => {
                counter!("restaurant.orders.rejected", 1, "reason" => err.error_code());
                if err.status_code().is_server_error() {
                    error!(error = %err, "order placement failed");
                } else {
                    info!(code = err.error_code(), "order rejected: {}", err);
                }
            }
        }
        result
    }

    async fn place_order_once(
        &self,
        request: &PlaceOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<PlaceOrderResponse, ServiceError> {
        let (quote, resolved) = self
            .quote(&request.items, request.coupon_code.as_deref(), now)
            .await?;

        let draft = OrderDraft {
            customer_name: request.customer_name.trim().to_string(),
            table_number: request.table_number,
            special_instructions: request.special_instructions.clone(),
            coupon: resolved.as_ref().map(AppliedCoupon::from),
            quote,
        };
        let response = PlaceOrderResponse {
            order_id: 0,
            subtotal: draft.quote.subtotal,
            discount: draft.quote.discount,
            total: draft.quote.total,
        };

        let order_id = self.persist(draft, now).await?;
        Ok(PlaceOrderResponse {
            order_id,
            ..response
        })
    }

    /// Writes a priced order atomically and returns its id.
    ///
    /// A limited coupon is decremented first with a conditional update so
    /// that concurrent redemptions of the last use cannot both succeed.
    pub async fn persist(&self, draft: OrderDraft, now: DateTime<Utc>) -> Result<i32, ServiceError> {
        let redeemed = draft.coupon.as_ref().map(|c| c.code.clone());

        let order_id = in_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                if let Some(applied) = draft.coupon.as_ref().filter(|c| c.limited) {
                    let res = coupon::Entity::update_many()
                        .col_expr(
                            coupon::Column::Quantity,
                            Expr::col(coupon::Column::Quantity).sub(1),
                        )
                        .filter(coupon::Column::Id.eq(applied.id))
                        .filter(coupon::Column::Quantity.gt(0))
                        .filter(coupon::Column::IsActive.eq(true))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::classify_db)?;
                    if res.rows_affected == 0 {
                        return Err(ServiceError::CouponExhausted(format!(
                            "{} has no uses left",
                            applied.code
                        )));
                    }
                }

                let order = OrderActiveModel {
                    customer_name: Set(draft.customer_name),
                    table_number: Set(draft.table_number),
                    coupon_code: Set(draft.coupon.map(|c| c.code)),
                    subtotal: Set(draft.quote.subtotal),
                    discount: Set(draft.quote.discount),
                    total: Set(draft.quote.total),
                    special_instructions: Set(draft.special_instructions),
                    status: Set(OrderStatus::Pending),
                    items_json: Set(None),
                    created_at: Set(now),
                    updated_at: Set(Some(now)),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(ServiceError::classify_db)?;

                let mut rows = Vec::with_capacity(draft.quote.lines.len());
                for line in &draft.quote.lines {
                    rows.push(order_item::ActiveModel {
                        order_id: Set(order.id),
                        menu_item_id: Set(line.menu_item_id),
                        quantity: Set(i32_quantity(line.quantity)?),
                        price_at_order: Set(line.unit_price),
                        line_total: Set(line.line_total),
                        ..Default::default()
                    });
                }
                OrderItemEntity::insert_many(rows)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::classify_db)?;

                Ok(order.id)
            })
        })
        .await?;

        if let Some(code) = redeemed {
            counter!("restaurant.coupons.redeemed", 1);
            info!(order_id, coupon = %code, "coupon redeemed");
        }
        Ok(order_id)
    }

    /// Newest orders first, optionally filtered by status
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<OrderSummary>, u64), ServiceError> {
        let mut query = OrderEntity::find();
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .paginate(&*self.db_pool, limit.max(1));
        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::classify_db)?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::classify_db)?;

        Ok((orders.into_iter().map(OrderSummary::from).collect(), total))
    }

    async fn find_model(&self, id: i32) -> Result<order::Model, ServiceError> {
        OrderEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))
    }

    /// Order with its lines; falls back to the legacy JSON column for orders
    /// that have no `order_items` rows.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<OrderDetails, ServiceError> {
        let model = self.find_model(id).await?;

        let rows = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        let items = if rows.is_empty() {
            model.items_json.as_ref().map(legacy_lines).unwrap_or_default()
        } else {
            let ids: Vec<i32> = rows.iter().map(|r| r.menu_item_id).collect();
            let names: HashMap<i32, String> = menu_item::Entity::find()
                .filter(menu_item::Column::Id.is_in(ids))
                .all(&*self.db_pool)
                .await
                .map_err(ServiceError::classify_db)?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect();
            rows.into_iter()
                .map(|row| OrderLineView {
                    name: names.get(&row.menu_item_id).cloned(),
                    menu_item_id: Some(row.menu_item_id),
                    quantity: row.quantity,
                    price_at_order: row.price_at_order,
                    line_total: row.line_total,
                })
                .collect()
        };

        Ok(OrderDetails {
            order: model.into(),
            items,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update_order(
        &self,
        id: i32,
        request: UpdateOrderRequest,
    ) -> Result<OrderSummary, ServiceError> {
        request.validate()?;
        let next = request.status.as_deref().map(parse_status).transpose()?;
        let existing = self.find_model(id).await?;

        if let Some(next) = next {
            ensure_transition(id, existing.status, next)?;
        }

        let mut active: OrderActiveModel = existing.into();
        if let Some(next) = next {
            active.status = Set(next);
        }
        if request.special_instructions.is_some() {
            active.special_instructions = Set(request.special_instructions);
        }
        active.updated_at = Set(Some(Utc::now()));

        let model = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        next: OrderStatus,
    ) -> Result<OrderSummary, ServiceError> {
        let existing = self.find_model(id).await?;
        ensure_transition(id, existing.status, next)?;

        let mut active: OrderActiveModel = existing.into();
        active.status = Set(next);
        active.updated_at = Set(Some(Utc::now()));
        let model = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::classify_db)?;

        counter!("restaurant.orders.status_changed", 1, "status" => next.to_string());
        info!(order_id = id, status = %next, "order status changed");
        Ok(model.into())
    }

    pub async fn cancel_order(&self, id: i32) -> Result<OrderSummary, ServiceError> {
        self.update_status(id, OrderStatus::Cancelled).await
    }

    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i32) -> Result<(), ServiceError> {
        in_transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                OrderItemEntity::delete_many()
                    .filter(order_item::Column::OrderId.eq(id))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::classify_db)?;
                let result = OrderEntity::delete_by_id(id)
                    .exec(txn)
                    .await
                    .map_err(ServiceError::classify_db)?;
                if result.rows_affected == 0 {
                    return Err(ServiceError::NotFound(format!("Order {id} not found")));
                }
                Ok(())
            })
        })
        .await?;
        info!(order_id = id, "order deleted");
        Ok(())
    }
}

fn ensure_transition(id: i32, current: OrderStatus, next: OrderStatus) -> Result<(), ServiceError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(ServiceError::InvalidOperation(format!(
            "Order {id} is {current} and cannot move to {next}"
        )))
    }
}
