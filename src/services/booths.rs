use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
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
    auth::AuthUser,
    entities::{
        accounting_transaction,
        booth::{self, Entity as BoothEntity},
    },
    errors::ServiceError,
    services::reconciliation::TransactionKind,
};

pub const BOOTH_SETUP_CATEGORY: &str = "booth_setup";
pub const BOOTH_RELATED_TYPE: &str = "booth";

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateBoothInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub location: Option<String>,
    /// One-off setup cost booked as an expense on creation
    pub setup_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateBoothInput {
    pub name: Option<String>,
    pub location: Option<String>,
    pub active: Option<bool>,
}

/// Booth lifecycle management within a brand
pub struct BoothService {
    db: Arc<DatabaseConnection>,
}

impl BoothService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        input: CreateBoothInput,
    ) -> Result<booth::Model, ServiceError> {
        user.require_admin()?;
        user.require_brand(brand_id)?;
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let now = Utc::now();
        let created = booth::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(brand_id),
            name: Set(input.name),
            location: Set(input.location),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&*self.db)
        .await?;

        if let Some(cost) = input.setup_cost {
            if cost > Decimal::ZERO {
                accounting_transaction::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    brand_id: Set(brand_id),
                    booth_id: Set(Some(created.id)),
                    kind: Set(TransactionKind::Expense.to_string()),
                    category: Set(BOOTH_SETUP_CATEGORY.to_string()),
                    amount: Set(cost),
                    description: Set(Some(format!("setup of booth {}", created.name))),
                    related_id: Set(Some(created.id)),
                    related_type: Set(Some(BOOTH_RELATED_TYPE.to_string())),
                    created_by: Set(Some(user.user_id)),
                    created_at: Set(Utc::now().into()),
                }
                .insert(&*self.db)
                .await?;
            }
        }

        Ok(created)
    }

    #[instrument(skip(self, user, input), fields(booth_id = %booth_id))]
    pub async fn update(
        &self,
        user: &AuthUser,
        booth_id: Uuid,
        input: UpdateBoothInput,
    ) -> Result<booth::Model, ServiceError> {
        user.require_admin()?;
        let found = self.find_owned(user, booth_id).await?;

        let mut active: booth::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self, user), fields(booth_id = %booth_id))]
    pub async fn delete(&self, user: &AuthUser, booth_id: Uuid) -> Result<(), ServiceError> {
        user.require_admin()?;
        let found = self.find_owned(user, booth_id).await?;
        BoothEntity::delete_by_id(found.id).exec(&*self.db).await?;
        Ok(())
    }

    pub async fn get(&self, user: &AuthUser, booth_id: Uuid) -> Result<booth::Model, ServiceError> {
        self.find_owned(user, booth_id).await
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<booth::Model>, u64), ServiceError> {
        user.require_brand(brand_id)?;

        let paginator = BoothEntity::find()
            .filter(booth::Column::BrandId.eq(brand_id))
            .order_by_asc(booth::Column::Name)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let booths = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((booths, total))
    }

    async fn find_owned(
        &self,
        user: &AuthUser,
        booth_id: Uuid,
    ) -> Result<booth::Model, ServiceError> {
        let found = BoothEntity::find_by_id(booth_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booth {booth_id} not found")))?;
        user.require_brand(found.brand_id)?;
        Ok(found)
    }
}
