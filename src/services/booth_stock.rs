use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    entities::{
        booth::Entity as BoothEntity,
        booth_stock::{self, Entity as BoothStockEntity},
        ingredient::{self, Entity as IngredientEntity},
        stock_movement,
    },
    errors::ServiceError,
    events::RealtimeEvent,
    realtime::EventBroadcaster,
    services::reconciliation::{MovementType, StockLocks},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AllocateStockInput {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
}

/// Warehouse-to-booth stock allocation and booth stock queries. Shares
/// the per-(booth, ingredient) locks with reconciliation so allocations
/// and concurrent sales cannot interleave their read-modify-writes.
pub struct BoothStockService {
    db: Arc<DatabaseConnection>,
    events: Arc<EventBroadcaster>,
    locks: Arc<StockLocks>,
}

impl BoothStockService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        events: Arc<EventBroadcaster>,
        locks: Arc<StockLocks>,
    ) -> Self {
        Self { db, events, locks }
    }

    /// Moves warehouse stock to a booth. Unlike reconciliation this is
    /// an operator action, so insufficient warehouse stock is rejected
    /// rather than clamped.
    #[instrument(skip(self, user, input), fields(booth_id = %booth_id))]
    pub async fn allocate(
        &self,
        user: &AuthUser,
        booth_id: Uuid,
        input: AllocateStockInput,
    ) -> Result<booth_stock::Model, ServiceError> {
        user.require_admin()?;
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "allocation quantity must be positive".to_string(),
            ));
        }

        let db = &*self.db;
        let booth = BoothEntity::find_by_id(booth_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booth {booth_id} not found")))?;
        user.require_brand(booth.brand_id)?;

        let _guard = self.locks.acquire(booth_id, input.ingredient_id).await;

        let found = IngredientEntity::find_by_id(input.ingredient_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {} not found", input.ingredient_id))
            })?;
        if found.brand_id != booth.brand_id {
            return Err(ServiceError::ValidationError(
                "ingredient belongs to another brand".to_string(),
            ));
        }
        if found.stock < input.quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "warehouse has {} {}, requested {}",
                found.stock, found.unit, input.quantity
            )));
        }

        let ingredient_id = found.id;
        let ingredient_name = found.name.clone();
        let new_central = found.stock - input.quantity;
        let mut active: ingredient::ActiveModel = found.into();
        active.stock = Set(new_central);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;

        let existing = BoothStockEntity::find()
            .filter(booth_stock::Column::BoothId.eq(booth_id))
            .filter(booth_stock::Column::IngredientId.eq(ingredient_id))
            .one(db)
            .await?;

        let (old_remaining, updated) = match existing {
            Some(stock) => {
                let old_remaining = stock.remaining;
                let allocated = stock.allocated + input.quantity;
                let remaining = (allocated - stock.used).clamp(Decimal::ZERO, allocated);
                let mut active: booth_stock::ActiveModel = stock.into();
                active.allocated = Set(allocated);
                active.remaining = Set(remaining);
                active.updated_at = Set(Utc::now().into());
                (old_remaining, active.update(db).await?)
            }
            None => {
                let fresh = booth_stock::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    booth_id: Set(booth_id),
                    ingredient_id: Set(ingredient_id),
                    allocated: Set(input.quantity),
                    used: Set(Decimal::ZERO),
                    remaining: Set(input.quantity),
                    updated_at: Set(Utc::now().into()),
                };
                (Decimal::ZERO, fresh.insert(db).await?)
            }
        };

        let movement = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(booth.brand_id),
            ingredient_id: Set(ingredient_id),
            booth_id: Set(Some(booth_id)),
            sale_id: Set(None),
            movement_type: Set(MovementType::Adjustment.to_string()),
            quantity: Set(-input.quantity),
            note: Set(Some(format!("allocated to booth {}", booth.name))),
            created_by: Set(Some(user.user_id)),
            created_at: Set(Utc::now().into()),
        };
        movement.insert(db).await?;

        self.events.broadcast(&RealtimeEvent::stock_update(
            booth.brand_id,
            booth_id,
            ingredient_id,
            &ingredient_name,
            old_remaining,
            updated.remaining,
        ));

        info!(
            booth_id = %booth_id,
            ingredient_id = %ingredient_id,
            quantity = %input.quantity,
            "stock allocated to booth"
        );

        Ok(updated)
    }

    /// All stock entries for one booth
    pub async fn list_for_booth(
        &self,
        user: &AuthUser,
        booth_id: Uuid,
    ) -> Result<Vec<booth_stock::Model>, ServiceError> {
        let db = &*self.db;
        let booth = BoothEntity::find_by_id(booth_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booth {booth_id} not found")))?;
        user.require_brand(booth.brand_id)?;

        Ok(BoothStockEntity::find()
            .filter(booth_stock::Column::BoothId.eq(booth_id))
            .all(db)
            .await?)
    }
}
