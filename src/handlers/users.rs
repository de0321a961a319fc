use axum::{
    extract::{Query, State},
    Json,
};

use super::BrandScope;
use crate::{
    auth::AuthUser,
    entities::user,
    handlers::auth::UserProfile,
    services::users::CreateUserInput,
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Json(input): Json<CreateUserInput>,
) -> ApiResult<UserProfile> {
    let brand_id = scope.brand_id.or(user.brand_id);
    let created = state.services.users.create(&user, brand_id, input).await?;
    Ok(Json(ApiResponse::success(UserProfile::from(&created))))
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(scope): Query<BrandScope>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<user::Model>> {
    let brand_id = user.acting_brand(scope.brand_id)?;
    let (items, total) = state
        .services
        .users
        .list(&user, brand_id, query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, &query,
    ))))
}
