use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use sea_orm::sea_query::Expr;
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    entities::{
        accounting_transaction,
        ingredient::{self, Entity as IngredientEntity},
        stock_movement,
    },
    errors::ServiceError,
    services::reconciliation::{MovementType, TransactionKind},
};

pub const STOCK_PURCHASE_CATEGORY: &str = "stock_purchase";
pub const STOCK_PURCHASE_RELATED_TYPE: &str = "stock_purchase";

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateIngredientInput {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub unit: String,
    pub cost_per_unit: Option<Decimal>,
    pub minimum_stock: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateIngredientInput {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub cost_per_unit: Option<Decimal>,
    pub minimum_stock: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PurchaseIngredientInput {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// Warehouse ingredient management for a brand
pub struct IngredientService {
    db: Arc<DatabaseConnection>,
}

impl IngredientService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        input: CreateIngredientInput,
    ) -> Result<ingredient::Model, ServiceError> {
        user.require_admin()?;
        user.require_brand(brand_id)?;
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let now = Utc::now();
        let model = ingredient::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(brand_id),
            name: Set(input.name),
            unit: Set(input.unit),
            cost_per_unit: Set(input.cost_per_unit.unwrap_or(Decimal::ZERO)),
            stock: Set(Decimal::ZERO),
            minimum_stock: Set(input.minimum_stock.unwrap_or(Decimal::ZERO)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self, user, input), fields(ingredient_id = %ingredient_id))]
    pub async fn update(
        &self,
        user: &AuthUser,
        ingredient_id: Uuid,
        input: UpdateIngredientInput,
    ) -> Result<ingredient::Model, ServiceError> {
        user.require_admin()?;

        let found = self.find_owned(user, ingredient_id).await?;
        let mut active: ingredient::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(unit) = input.unit {
            active.unit = Set(unit);
        }
        if let Some(cost) = input.cost_per_unit {
            active.cost_per_unit = Set(cost);
        }
        if let Some(minimum) = input.minimum_stock {
            active.minimum_stock = Set(minimum);
        }
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self, user), fields(ingredient_id = %ingredient_id))]
    pub async fn delete(&self, user: &AuthUser, ingredient_id: Uuid) -> Result<(), ServiceError> {
        user.require_admin()?;
        let found = self.find_owned(user, ingredient_id).await?;
        IngredientEntity::delete_by_id(found.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    /// Restocks the warehouse: increases stock, records a purchase
    /// movement, and books the matching expense.
    #[instrument(skip(self, user, input), fields(ingredient_id = %ingredient_id))]
    pub async fn purchase(
        &self,
        user: &AuthUser,
        ingredient_id: Uuid,
        input: PurchaseIngredientInput,
    ) -> Result<ingredient::Model, ServiceError> {
        user.require_admin()?;
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "purchase quantity must be positive".to_string(),
            ));
        }
        if input.unit_cost < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "unit cost cannot be negative".to_string(),
            ));
        }

        let db = &*self.db;
        let found = self.find_owned(user, ingredient_id).await?;
        let brand_id = found.brand_id;
        let name = found.name.clone();
        let new_stock = found.stock + input.quantity;

        let mut active: ingredient::ActiveModel = found.into();
        active.stock = Set(new_stock);
        active.cost_per_unit = Set(input.unit_cost);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;

        let movement_id = Uuid::new_v4();
        let movement = stock_movement::ActiveModel {
            id: Set(movement_id),
            brand_id: Set(brand_id),
            ingredient_id: Set(ingredient_id),
            booth_id: Set(None),
            sale_id: Set(None),
            movement_type: Set(MovementType::Purchase.to_string()),
            quantity: Set(input.quantity),
            note: Set(None),
            created_by: Set(Some(user.user_id)),
            created_at: Set(Utc::now().into()),
        };
        movement.insert(db).await?;

        let expense = accounting_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(brand_id),
            booth_id: Set(None),
            kind: Set(TransactionKind::Expense.to_string()),
            category: Set(STOCK_PURCHASE_CATEGORY.to_string()),
            amount: Set(input.quantity * input.unit_cost),
            description: Set(Some(format!("purchase of {name}"))),
            related_id: Set(Some(movement_id)),
            related_type: Set(Some(STOCK_PURCHASE_RELATED_TYPE.to_string())),
            created_by: Set(Some(user.user_id)),
            created_at: Set(Utc::now().into()),
        };
        expense.insert(db).await?;

        info!(
            ingredient_id = %ingredient_id,
            quantity = %input.quantity,
            "ingredient purchased"
        );

        Ok(updated)
    }

    pub async fn get(
        &self,
        user: &AuthUser,
        ingredient_id: Uuid,
    ) -> Result<ingredient::Model, ServiceError> {
        self.find_owned(user, ingredient_id).await
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ingredient::Model>, u64), ServiceError> {
        user.require_brand(brand_id)?;

        let paginator = IngredientEntity::find()
            .filter(ingredient::Column::BrandId.eq(brand_id))
            .order_by_asc(ingredient::Column::Name)
            .paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Warehouse ingredients at or below their minimum stock threshold
    pub async fn low_stock(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
    ) -> Result<Vec<ingredient::Model>, ServiceError> {
        user.require_brand(brand_id)?;

        Ok(IngredientEntity::find()
            .filter(ingredient::Column::BrandId.eq(brand_id))
            .filter(
                Expr::col(ingredient::Column::Stock)
                    .lte(Expr::col(ingredient::Column::MinimumStock)),
            )
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db)
            .await?)
    }

    async fn find_owned(
        &self,
        user: &AuthUser,
        ingredient_id: Uuid,
    ) -> Result<ingredient::Model, ServiceError> {
        let found = IngredientEntity::find_by_id(ingredient_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {ingredient_id} not found"))
            })?;
        user.require_brand(found.brand_id)?;
        Ok(found)
    }
}
