use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, Entity as UserEntity};
use crate::errors::ServiceError;

/// Cookie carrying the access token for browser clients
pub const AUTH_COOKIE: &str = "auth-token";

/// User roles, from widest to narrowest scope
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Staff,
}

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub brand_id: Option<Uuid>,
    pub booth_id: Option<Uuid>,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller extracted from a validated token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub brand_id: Option<Uuid>,
    pub booth_id: Option<Uuid>,
    pub token_id: String,
}

impl AuthUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Super-admins reach every brand; everyone else only their own.
    pub fn can_access_brand(&self, brand_id: Uuid) -> bool {
        self.is_super_admin() || self.brand_id == Some(brand_id)
    }

    pub fn require_brand(&self, brand_id: Uuid) -> Result<(), ServiceError> {
        if self.can_access_brand(brand_id) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "caller does not belong to this brand".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        match self.role {
            Role::SuperAdmin | Role::Admin => Ok(()),
            Role::Staff => Err(ServiceError::Forbidden(
                "administrator role required".to_string(),
            )),
        }
    }

    pub fn require_super_admin(&self) -> Result<(), ServiceError> {
        if self.is_super_admin() {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "super administrator role required".to_string(),
            ))
        }
    }

    /// The brand the caller operates on. Super-admins must name a brand
    /// explicitly, everyone else is pinned to their own.
    pub fn acting_brand(&self, explicit: Option<Uuid>) -> Result<Uuid, ServiceError> {
        match (self.brand_id, explicit) {
            (Some(own), Some(requested)) if own != requested && !self.is_super_admin() => {
                Err(ServiceError::Forbidden(
                    "caller does not belong to this brand".to_string(),
                ))
            }
            (Some(own), _) if !self.is_super_admin() => Ok(own),
            (_, Some(requested)) => Ok(requested),
            (Some(own), None) => Ok(own),
            (None, None) => Err(ServiceError::InvalidInput(
                "brand_id is required".to_string(),
            )),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".to_string()))
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, access_token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_issuer: "marketbooth-auth".to_string(),
            jwt_audience: "marketbooth-api".to_string(),
            access_token_expiration,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuth | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::InvalidCredentials | Self::AccountDisabled => StatusCode::UNAUTHORIZED,
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuth
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => ServiceError::Unauthorized(err.to_string()),
            other => ServiceError::InternalError(other.to_string()),
        }
    }
}

/// Issued token plus metadata returned to the login caller
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Authentication service handling password checks and token issuance
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::InternalError(format!("password hashing failed: {e}")))
    }

    pub fn verify_password(password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Validates email/password and returns the user with a fresh token
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(user::Model, TokenResponse), AuthError> {
        let found = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !Self::verify_password(password, &found.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !found.active {
            return Err(AuthError::AccountDisabled);
        }

        let token = self.generate_token(&found)?;
        Ok((found, token))
    }

    pub fn generate_token(&self, user: &user::Model) -> Result<TokenResponse, AuthError> {
        let now = Utc::now();
        let expires_in = self.config.access_token_expiration.as_secs() as i64;
        let role = user
            .role
            .parse::<Role>()
            .map_err(|_| AuthError::InternalError(format!("unknown role: {}", user.role)))?;

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role,
            brand_id: user.brand_id,
            booth_id: user.booth_id,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: now.timestamp() + expires_in,
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        })
    }

    /// Validates a JWT and extracts its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

/// Pulls the token from `Authorization: Bearer` or the auth cookie.
fn extract_token(parts: &http::HeaderMap) -> Option<String> {
    if let Some(value) = parts.get(header::AUTHORIZATION) {
        if let Ok(value) = value.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let cookies = parts.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == AUTH_COOKIE).then(|| value.to_string())
    })
}

/// Middleware validating the caller's token and stashing an [`AuthUser`]
/// in request extensions for handlers and extractors downstream.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(request.headers()).ok_or(AuthError::MissingAuth)?;
    let claims = auth.validate_token(&token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
    request.extensions_mut().insert(AuthUser {
        user_id,
        name: claims.name,
        role: claims.role,
        brand_id: claims.brand_id,
        booth_id: claims.booth_id,
        token_id: claims.jti,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            name: "tester".into(),
            role,
            brand_id: Some(Uuid::new_v4()),
            booth_id: None,
            token_id: "jti".into(),
        }
    }

    #[test]
    fn password_round_trip() {
        let hash = AuthService::hash_password("s3cret").unwrap();
        assert!(AuthService::verify_password("s3cret", &hash));
        assert!(!AuthService::verify_password("wrong", &hash));
    }

    #[test]
    fn brand_scoping() {
        let user = test_user(Role::Admin);
        let own = user.brand_id.unwrap();
        assert!(user.can_access_brand(own));
        assert!(!user.can_access_brand(Uuid::new_v4()));

        let root = AuthUser {
            brand_id: None,
            ..test_user(Role::SuperAdmin)
        };
        assert!(root.can_access_brand(Uuid::new_v4()));
    }

    #[test]
    fn staff_cannot_pass_admin_check() {
        assert!(test_user(Role::Staff).require_admin().is_err());
        assert!(test_user(Role::Admin).require_admin().is_ok());
    }

    #[test]
    fn role_strings_round_trip() {
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(Role::Staff.to_string(), "staff");
    }
}
