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
    entities::sale,
    services::sales::{CreateSaleInput, SaleWithItems, UpdateSaleInput},
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SaleFilter {
    pub booth_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/sales",
    params(BrandScope, SaleFilter, ListQuery),
    responses((status = 200, description = "Paginated sales, newest first")),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Query(filter): Query<SaleFilter>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<sale::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let (items, total) = state
        .services
        .sales
        .list(&user, brand_id, filter.booth_id, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

/// Records a sale. The terminal gets its answer as soon as the sale
/// rows are written; stock and accounting reconciliation runs after.
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = CreateSaleInput,
    responses(
        (status = 200, description = "Sale recorded"),
        (status = 400, description = "Invalid line items"),
        (status = 403, description = "Not the caller's booth"),
    ),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateSaleInput>,
) -> ApiResult<SaleWithItems> {
    let created = state.services.sales.create(&user, input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<SaleWithItems> {
    let found = state.services.sales.get(&user, id).await?;
    Ok(Json(ApiResponse::success(found)))
}

/// Replaces a sale's line items; previously applied stock and
/// accounting effects are reversed and re-applied asynchronously.
#[utoipa::path(
    put,
    path = "/api/v1/sales/{id}",
    request_body = UpdateSaleInput,
    responses(
        (status = 200, description = "Sale updated"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown sale"),
    ),
    tag = "sales"
)]
pub async fn update_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSaleInput>,
) -> ApiResult<SaleWithItems> {
    let updated = state.services.sales.update(&user, id, input).await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/sales/{id}",
    responses(
        (status = 200, description = "Sale deletion scheduled"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Unknown sale"),
    ),
    tag = "sales"
)]
pub async fn delete_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.sales.delete(&user, id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}
