use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AuthService, AuthUser, Role},
    entities::user::{self, Entity as UserEntity},
    errors::ServiceError,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub role: Role,
    /// Booth assignment; required for staff
    pub booth_id: Option<Uuid>,
}

/// Staff and administrator account management
pub struct UserService {
    db: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a user inside a brand. Admins may create admins and
    /// staff for their own brand; only super-admins create other
    /// super-admins (which have no brand).
    #[instrument(skip(self, user, input))]
    pub async fn create(
        &self,
        user: &AuthUser,
        brand_id: Option<Uuid>,
        input: CreateUserInput,
    ) -> Result<user::Model, ServiceError> {
        user.require_admin()?;
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        match input.role {
            Role::SuperAdmin => user.require_super_admin()?,
            Role::Admin | Role::Staff => {
                let brand =
                    brand_id.ok_or_else(|| {
                        ServiceError::InvalidInput("brand_id is required".to_string())
                    })?;
                user.require_brand(brand)?;
            }
        }
        if input.role == Role::Staff && input.booth_id.is_none() {
            return Err(ServiceError::InvalidInput(
                "staff accounts need a booth assignment".to_string(),
            ));
        }

        let existing = UserEntity::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "a user with email {} already exists",
                input.email
            )));
        }

        let password_hash = AuthService::hash_password(&input.password)?;
        let now = Utc::now();
        Ok(user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            password_hash: Set(password_hash),
            name: Set(input.name),
            role: Set(input.role.to_string()),
            brand_id: Set(if input.role == Role::SuperAdmin {
                None
            } else {
                brand_id
            }),
            booth_id: Set(input.booth_id),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*self.db)
        .await?)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        UserEntity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {user_id} not found")))
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<user::Model>, u64), ServiceError> {
        user.require_admin()?;
        user.require_brand(brand_id)?;

        let paginator = UserEntity::find()
            .filter(user::Column::BrandId.eq(brand_id))
            .order_by_asc(user::Column::Name)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }
}
