use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::BrandScope;
use crate::{
    auth::AuthUser,
    entities::accounting_transaction,
    errors::ServiceError,
    services::{accounting::AccountingSummary, reconciliation::TransactionKind},
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionFilter {
    /// "income" or "expense"
    pub kind: Option<String>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Query(filter): Query<TransactionFilter>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<accounting_transaction::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let kind = filter
        .kind
        .as_deref()
        .map(|raw| {
            raw.parse::<TransactionKind>().map_err(|_| {
                ServiceError::InvalidInput(format!("unknown transaction kind: {raw}"))
            })
        })
        .transpose()?;

    let (items, total) = state
        .services
        .accounting
        .list(&user, brand_id, kind, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}

pub async fn accounting_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
) -> ApiResult<AccountingSummary> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let summary = state.services.accounting.summary(&user, brand_id).await?;
    Ok(Json(ApiResponse::success(summary)))
}
