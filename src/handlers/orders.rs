use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    errors::ServiceError,
    handlers::common::{created, page_window, paginated},
    services::orders::{
        parse_status, OrderDetails, OrderSummary, PlaceOrderRequest, PlaceOrderResponse,
        UpdateOrderRequest, UpdateOrderStatusRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

/// Query parameters for the admin order book
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrderListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, capped by configuration
    pub limit: Option<u64>,
    /// Only orders in this status
    pub status: Option<String>,
}

/// Place an order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Place an order",
    description = "Prices the cart against the current menu, applies an optional coupon and \
                   stores the order. The coupon use is consumed in the same transaction.",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<PlaceOrderResponse>),
        (status = 400, description = "Invalid order", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown coupon", body = crate::errors::ErrorResponse),
        (status = 409, description = "Coupon exhausted", body = crate::errors::ErrorResponse),
        (status = 410, description = "Coupon outside its validity window", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown menu item or coupon condition not met", body = crate::errors::ErrorResponse),
        (status = 503, description = "Storage temporarily unavailable", body = crate::errors::ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlaceOrderResponse>>), ServiceError> {
    let placed = state
        .services
        .orders
        .place_order(request, Utc::now())
        .await?;
    Ok(created(placed))
}

/// Order book, newest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<PaginatedResponse<OrderSummary>>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<OrderSummary>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let (page, limit) = page_window(query.page, query.limit, &state.config);

    let (orders, total) = state
        .services
        .orders
        .list_orders(page, limit, status)
        .await?;
    Ok(Json(ApiResponse::success(paginated(
        orders, total, page, limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<OrderDetails>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<OrderDetails> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Edit status and special instructions; lines and totals are immutable
#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderSummary>),
        (status = 400, description = "Invalid update or status transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateOrderRequest>,
) -> ApiResult<OrderSummary> {
    let order = state.services.orders.update_order(id, request).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<OrderSummary>),
        (status = 400, description = "Unknown status or illegal transition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> ApiResult<OrderSummary> {
    request.validate()?;
    let next = parse_status(&request.status)?;
    let order = state.services.orders.update_status(id, next).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/orders/{id}/cancel",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<OrderSummary>),
        (status = 400, description = "Order already delivered or cancelled", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<OrderSummary> {
    let order = state.services.orders.cancel_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
