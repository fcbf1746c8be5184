use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    errors::ServiceError,
    handlers::common::created,
    services::catalog::{CreateMenuItemRequest, MenuItemResponse, UpdateMenuItemRequest},
    ApiResponse, ApiResult, AppState,
};

/// List the menu
#[utoipa::path(
    get,
    path = "/api/v1/menu",
    summary = "List menu",
    description = "Every menu item with its category name and top-pick flag",
    responses(
        (status = 200, description = "Menu retrieved", body = ApiResponse<Vec<MenuItemResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Menu"
)]
pub async fn list_menu(State(state): State<AppState>) -> ApiResult<Vec<MenuItemResponse>> {
    let items = state.services.catalog.list_menu().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Get one menu item
#[utoipa::path(
    get,
    path = "/api/v1/menu/{id}",
    params(("id" = i32, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item retrieved", body = ApiResponse<MenuItemResponse>),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<MenuItemResponse> {
    let item = state.services.catalog.get_menu_item(id).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// List the menu (admin)
#[utoipa::path(
    get,
    path = "/api/v1/admin/menu",
    responses(
        (status = 200, description = "Menu retrieved", body = ApiResponse<Vec<MenuItemResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn admin_list_menu(State(state): State<AppState>) -> ApiResult<Vec<MenuItemResponse>> {
    let items = state.services.catalog.list_menu().await?;
    Ok(Json(ApiResponse::success(items)))
}

/// Create a menu item
#[utoipa::path(
    post,
    path = "/api/v1/admin/menu",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = ApiResponse<MenuItemResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown category", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(request): Json<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MenuItemResponse>>), ServiceError> {
    let item = state.services.catalog.create_menu_item(request).await?;
    Ok(created(item))
}

/// Update a menu item; absent fields are left unchanged
#[utoipa::path(
    put,
    path = "/api/v1/admin/menu/{id}",
    params(("id" = i32, Path, description = "Menu item id")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItemResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown category", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateMenuItemRequest>,
) -> ApiResult<MenuItemResponse> {
    let item = state.services.catalog.update_menu_item(id, request).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Delete a menu item that no order references
#[utoipa::path(
    delete,
    path = "/api/v1/admin/menu/{id}",
    params(("id" = i32, Path, description = "Menu item id")),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 404, description = "Menu item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Menu item appears in order history", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.catalog.delete_menu_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
