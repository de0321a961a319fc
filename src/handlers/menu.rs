use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::BrandScope;
use crate::{
    auth::AuthUser,
    entities::menu_item,
    services::menu::{CreateMenuItemInput, MenuItemWithRecipe, UpdateMenuItemInput},
    ApiResponse, ApiResult, AppState,
};

pub async fn list_menu_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
) -> ApiResult<Vec<menu_item::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let items = state.services.menu.list(&user, brand_id).await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Json(input): Json<CreateMenuItemInput>,
) -> ApiResult<MenuItemWithRecipe> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let created = state.services.menu.create(&user, brand_id, input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn get_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<MenuItemWithRecipe> {
    let found = state.services.menu.get(&user, id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateMenuItemInput>,
) -> ApiResult<MenuItemWithRecipe> {
    let updated = state.services.menu.update(&user, id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.menu.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
