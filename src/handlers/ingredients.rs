use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::BrandScope;
use crate::{
    auth::AuthUser,
    entities::ingredient,
    services::ingredients::{
        CreateIngredientInput, PurchaseIngredientInput, UpdateIngredientInput,
    },
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/ingredients",
    params(BrandScope, ListQuery),
    responses((status = 200, description = "Paginated ingredients")),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<ingredient::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let (items, total) = state
        .services
        .ingredients
        .list(&user, brand_id, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

pub async fn create_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Json(input): Json<CreateIngredientInput>,
) -> ApiResult<ingredient::Model> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let created = state
        .services
        .ingredients
        .create(&user, brand_id, input)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

/// Warehouse ingredients at or below their minimum stock
#[utoipa::path(
    get,
    path = "/api/v1/ingredients/low-stock",
    params(BrandScope),
    responses((status = 200, description = "Ingredients at or below minimum stock")),
    tag = "ingredients"
)]
pub async fn low_stock_ingredients(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
) -> ApiResult<Vec<ingredient::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let items = state.services.ingredients.low_stock(&user, brand_id).await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ingredient::Model> {
    let found = state.services.ingredients.get(&user, id).await?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn update_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateIngredientInput>,
) -> ApiResult<ingredient::Model> {
    let updated = state.services.ingredients.update(&user, id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.ingredients.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}

/// Restocks the warehouse and books the matching expense
#[utoipa::path(
    post,
    path = "/api/v1/ingredients/{id}/purchase",
    request_body = PurchaseIngredientInput,
    responses(
        (status = 200, description = "Ingredient restocked"),
        (status = 404, description = "Unknown ingredient"),
    ),
    tag = "ingredients"
)]
pub async fn purchase_ingredient(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<PurchaseIngredientInput>,
) -> ApiResult<ingredient::Model> {
    let updated = state.services.ingredients.purchase(&user, id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}
