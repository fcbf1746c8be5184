use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    errors::ServiceError,
    handlers::common::created,
    services::catalog::{AddTopPickRequest, TopPickResponse},
    ApiResponse, ApiResult, AppState,
};

/// Featured menu items
#[utoipa::path(
    get,
    path = "/api/v1/top-picks",
    responses(
        (status = 200, description = "Top picks retrieved", body = ApiResponse<Vec<TopPickResponse>>),
    ),
    tag = "Menu"
)]
pub async fn list_top_picks(State(state): State<AppState>) -> ApiResult<Vec<TopPickResponse>> {
    let picks = state.services.catalog.list_top_picks().await?;
    Ok(Json(ApiResponse::success(picks)))
}

/// Featured menu items (admin)
#[utoipa::path(
    get,
    path = "/api/v1/admin/top-picks",
    responses(
        (status = 200, description = "Top picks retrieved", body = ApiResponse<Vec<TopPickResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn admin_list_top_picks(
    State(state): State<AppState>,
) -> ApiResult<Vec<TopPickResponse>> {
    let picks = state.services.catalog.list_top_picks().await?;
    Ok(Json(ApiResponse::success(picks)))
}

/// Feature a menu item
#[utoipa::path(
    post,
    path = "/api/v1/admin/top-picks",
    request_body = AddTopPickRequest,
    responses(
        (status = 201, description = "Top pick added", body = ApiResponse<TopPickResponse>),
        (status = 409, description = "Already a top pick", body = crate::errors::ErrorResponse),
        (status = 422, description = "Unknown menu item", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn add_top_pick(
    State(state): State<AppState>,
    Json(request): Json<AddTopPickRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TopPickResponse>>), ServiceError> {
    let pick = state.services.catalog.add_top_pick(request).await?;
    Ok(created(pick))
}

/// Stop featuring a menu item
#[utoipa::path(
    delete,
    path = "/api/v1/admin/top-picks/{id}",
    params(("id" = i32, Path, description = "Top pick id")),
    responses(
        (status = 204, description = "Top pick removed"),
        (status = 404, description = "Top pick not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Admin"
)]
pub async fn remove_top_pick(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.catalog.remove_top_pick(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
