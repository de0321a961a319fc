use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::BrandScope;
use crate::{
    auth::AuthUser,
    entities::{booth_stock, stock_movement},
    services::booth_stock::AllocateStockInput,
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MovementFilter {
    pub ingredient_id: Option<Uuid>,
    pub booth_id: Option<Uuid>,
}

/// Moves warehouse stock to a booth
#[utoipa::path(
    post,
    path = "/api/v1/booths/{id}/stock/allocate",
    request_body = AllocateStockInput,
    responses(
        (status = 200, description = "Stock allocated"),
        (status = 422, description = "Insufficient warehouse stock"),
    ),
    tag = "stock"
)]
pub async fn allocate_booth_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AllocateStockInput>,
) -> ApiResult<booth_stock::Model> {
    let updated = state
        .services
        .booth_stock
        .allocate(&user, id, input)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn list_booth_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<booth_stock::Model>> {
    let entries = state.services.booth_stock.list_for_booth(&user, id).await?;
    Ok(Json(ApiResponse::success(entries)))
}

pub async fn list_stock_movements(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Query(filter): Query<MovementFilter>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<stock_movement::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let (items, total) = state
        .services
        .stock_movements
        .list(
            &user,
            brand_id,
            filter.ingredient_id,
            filter.booth_id,
            query.page,
            query.limit,
        )
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}
