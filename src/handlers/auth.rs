use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::{AuthUser, TokenResponse, AUTH_COOKIE},
    entities::user,
    errors::ServiceError,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub brand_id: Option<String>,
    pub booth_id: Option<String>,
}

impl From<&user::Model> for UserProfile {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id.to_string(),
            email: model.email.clone(),
            name: model.name.clone(),
            role: model.role.clone(),
            brand_id: model.brand_id.map(|id| id.to_string()),
            booth_id: model.booth_id.map(|id| id.to_string()),
        }
    }
}

/// Issues a token and sets it as the auth cookie for browser clients.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let (found, token) = state.auth.login(&request.email, &request.password).await?;

    let cookie = format!(
        "{AUTH_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        token.access_token, token.expires_in
    );
    let body = LoginResponse {
        user: UserProfile::from(&found),
        token,
    };

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::success(body)),
    ))
}

/// Returns the authenticated caller's profile.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Not authenticated"),
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, ServiceError> {
    let model = state.services.users.get(user.user_id).await?;
    Ok(Json(ApiResponse::success(UserProfile::from(&model))))
}
