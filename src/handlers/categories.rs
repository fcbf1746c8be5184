use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    errors::ServiceError,
    handlers::common::created,
    services::catalog::{CategoryRequest, CategoryResponse},
    ApiResponse, ApiResult, AppState,
};

/// List categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories retrieved", body = ApiResponse<Vec<CategoryResponse>>),
    ),
    tag = "Menu"
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryResponse>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category name already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ServiceError> {
    let category = state.services.catalog.create_category(request).await?;
    Ok(created(category))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = ApiResponse<CategoryResponse>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category name already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn rename_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<CategoryRequest>,
) -> ApiResult<CategoryResponse> {
    let category = state.services.catalog.rename_category(id, request).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// Delete an unused category
#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has menu items or coupons", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
