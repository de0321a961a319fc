use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryOrder,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    entities::brand::{self, Entity as BrandEntity},
    errors::ServiceError,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateBrandInput {
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateBrandInput {
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// Tenant management; super-admin only for mutations.
pub struct BrandService {
    db: Arc<DatabaseConnection>,
}

impl BrandService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create(
        &self,
        user: &AuthUser,
        input: CreateBrandInput,
    ) -> Result<brand::Model, ServiceError> {
        user.require_super_admin()?;
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let now = Utc::now();
        Ok(brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*self.db)
        .await?)
    }

    #[instrument(skip(self, user, input), fields(brand_id = %brand_id))]
    pub async fn update(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        input: UpdateBrandInput,
    ) -> Result<brand::Model, ServiceError> {
        user.require_super_admin()?;

        let found = BrandEntity::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {brand_id} not found")))?;

        let mut active: brand::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self, user), fields(brand_id = %brand_id))]
    pub async fn delete(&self, user: &AuthUser, brand_id: Uuid) -> Result<(), ServiceError> {
        user.require_super_admin()?;

        let found = BrandEntity::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {brand_id} not found")))?;
        BrandEntity::delete_by_id(found.id).exec(&*self.db).await?;
        Ok(())
    }

    pub async fn get(&self, user: &AuthUser, brand_id: Uuid) -> Result<brand::Model, ServiceError> {
        user.require_brand(brand_id)?;
        BrandEntity::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {brand_id} not found")))
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<brand::Model>, u64), ServiceError> {
        user.require_super_admin()?;

        let paginator = BrandEntity::find()
            .order_by_asc(brand::Column::Name)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let brands = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((brands, total))
    }
}
