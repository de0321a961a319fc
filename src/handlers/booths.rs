use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::BrandScope;
use crate::{
    auth::AuthUser,
    entities::{booth, menu_item},
    services::booths::{CreateBoothInput, UpdateBoothInput},
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

pub async fn list_booths(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<booth::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let (items, total) = state
        .services
        .booths
        .list(&user, brand_id, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

pub async fn create_booth(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Json(input): Json<CreateBoothInput>,
) -> ApiResult<booth::Model> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let created = state.services.booths.create(&user, brand_id, input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn get_booth(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<booth::Model> {
    let found = state.services.booths.get(&user, id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_booth(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBoothInput>,
) -> ApiResult<booth::Model> {
    let updated = state.services.booths.update(&user, id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_booth(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.booths.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}

/// Current menu for a booth (staff terminal view)
pub async fn booth_menu(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<menu_item::Model>> {
    // brand scoping is enforced against the booth itself
    let booth = state.services.booths.get(&user, id).await?;
    let items = state.services.menu.booth_menu(booth.id).await?;
    Ok(Json(ApiResponse::success(items)))
}
