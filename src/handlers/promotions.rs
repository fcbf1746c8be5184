use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    errors::ServiceError,
    handlers::common::created,
    services::promotions::{CreatePromotionRequest, PromotionResponse, UpdatePromotionRequest},
    ApiResponse, ApiResult, AppState,
};

/// Promotions running right now
#[utoipa::path(
    get,
    path = "/api/v1/promotions",
    responses(
        (status = 200, description = "Running promotions", body = ApiResponse<Vec<PromotionResponse>>),
    ),
    tag = "Promotions"
)]
pub async fn list_running_promotions(
    State(state): State<AppState>,
) -> ApiResult<Vec<PromotionResponse>> {
    let promotions = state.services.promotions.list_running(Utc::now()).await?;
    Ok(Json(ApiResponse::success(promotions)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/promotions",
    responses(
        (status = 200, description = "All promotions", body = ApiResponse<Vec<PromotionResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn list_promotions(State(state): State<AppState>) -> ApiResult<Vec<PromotionResponse>> {
    let promotions = state.services.promotions.list_promotions().await?;
    Ok(Json(ApiResponse::success(promotions)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/promotions/{id}",
    params(("id" = i32, Path, description = "Promotion id")),
    responses(
        (status = 200, description = "Promotion retrieved", body = ApiResponse<PromotionResponse>),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<PromotionResponse> {
    let promotion = state.services.promotions.get_promotion(id).await?;
    Ok(Json(ApiResponse::success(promotion)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/promotions",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Promotion created", body = ApiResponse<PromotionResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    Json(request): Json<CreatePromotionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PromotionResponse>>), ServiceError> {
    let promotion = state.services.promotions.create_promotion(request).await?;
    Ok(created(promotion))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/promotions/{id}",
    params(("id" = i32, Path, description = "Promotion id")),
    request_body = UpdatePromotionRequest,
    responses(
        (status = 200, description = "Promotion updated", body = ApiResponse<PromotionResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn update_promotion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdatePromotionRequest>,
) -> ApiResult<PromotionResponse> {
    let promotion = state
        .services
        .promotions
        .update_promotion(id, request)
        .await?;
    Ok(Json(ApiResponse::success(promotion)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/promotions/{id}",
    params(("id" = i32, Path, description = "Promotion id")),
    responses(
        (status = 204, description = "Promotion deleted"),
        (status = 404, description = "Promotion not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn delete_promotion(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.promotions.delete_promotion(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
