use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::brand,
    services::brands::{CreateBrandInput, UpdateBrandInput},
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

pub async fn list_brands(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<brand::Model>> {
    let (items, total) = state
        .services
        .brands
        .list(&user, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

pub async fn create_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateBrandInput>,
) -> ApiResult<brand::Model> {
    let created = state.services.brands.create(&user, input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn get_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<brand::Model> {
    let found = state.services.brands.get(&user, id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBrandInput>,
) -> ApiResult<brand::Model> {
    let updated = state.services.brands.update(&user, id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.brands.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
