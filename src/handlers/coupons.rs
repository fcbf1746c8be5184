use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    errors::ServiceError,
    handlers::common::created,
    services::{
        coupons::{CouponResponse, CreateCouponRequest, UpdateCouponRequest},
        orders::{CouponPreviewRequest, CouponPreviewResponse},
    },
    ApiResponse, ApiResult, AppState,
};

/// Coupons a customer can currently redeem
#[utoipa::path(
    get,
    path = "/api/v1/coupons",
    summary = "List redeemable coupons",
    description = "Active coupons inside their validity window with uses left",
    responses(
        (status = 200, description = "Coupons retrieved", body = ApiResponse<Vec<CouponResponse>>),
    ),
    tag = "Coupons"
)]
pub async fn list_active_coupons(State(state): State<AppState>) -> ApiResult<Vec<CouponResponse>> {
    let coupons = state.services.coupons.list_active(Utc::now()).await?;
    Ok(Json(ApiResponse::success(coupons)))
}

/// Price a cart against a coupon without placing an order
#[utoipa::path(
    post,
    path = "/api/v1/coupons/validate",
    request_body = CouponPreviewRequest,
    responses(
        (status = 200, description = "Coupon applies", body = ApiResponse<CouponPreviewResponse>),
        (status = 400, description = "Invalid cart", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown coupon", body = crate::errors::ErrorResponse),
        (status = 409, description = "Coupon exhausted", body = crate::errors::ErrorResponse),
        (status = 410, description = "Coupon outside its validity window", body = crate::errors::ErrorResponse),
        (status = 422, description = "Cart does not satisfy the coupon", body = crate::errors::ErrorResponse),
    ),
    tag = "Coupons"
)]
pub async fn preview_coupon(
    State(state): State<AppState>,
    Json(request): Json<CouponPreviewRequest>,
) -> ApiResult<CouponPreviewResponse> {
    let preview = state
        .services
        .orders
        .preview_coupon(request, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(preview)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons",
    responses(
        (status = 200, description = "All coupons", body = ApiResponse<Vec<CouponResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_coupons(State(state): State<AppState>) -> ApiResult<Vec<CouponResponse>> {
    let coupons = state.services.coupons.list_coupons().await?;
    Ok(Json(ApiResponse::success(coupons)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons/{id}",
    params(("id" = i32, Path, description = "Coupon id")),
    responses(
        (status = 200, description = "Coupon retrieved", body = ApiResponse<CouponResponse>),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<CouponResponse> {
    let coupon = state.services.coupons.get_coupon(id).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

/// Create a coupon; the rule is checked before anything is stored
#[utoipa::path(
    post,
    path = "/api/v1/admin/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = ApiResponse<CouponResponse>),
        (status = 400, description = "Invalid coupon definition", body = crate::errors::ErrorResponse),
        (status = 409, description = "Coupon code already exists", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown category", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(request): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CouponResponse>>), ServiceError> {
    let coupon = state.services.coupons.create_coupon(request).await?;
    Ok(created(coupon))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/coupons/{id}",
    params(("id" = i32, Path, description = "Coupon id")),
    request_body = UpdateCouponRequest,
    responses(
        (status = 200, description = "Coupon updated", body = ApiResponse<CouponResponse>),
        (status = 400, description = "Invalid coupon definition", body = crate::errors::ErrorResponse),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Coupon code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCouponRequest>,
) -> ApiResult<CouponResponse> {
    let coupon = state.services.coupons.update_coupon(id, request).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/coupons/{id}",
    params(("id" = i32, Path, description = "Coupon id")),
    responses(
        (status = 204, description = "Coupon deleted"),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.coupons.delete_coupon(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
