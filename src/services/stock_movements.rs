use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::stock_movement::{self, Entity as StockMovementEntity},
    errors::ServiceError,
};

/// Read access to the append-only stock movement ledger
pub struct StockMovementService {
    db: Arc<DatabaseConnection>,
}

impl StockMovementService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        ingredient_id: Option<Uuid>,
        booth_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        user.require_brand(brand_id)?;

        let mut query = StockMovementEntity::find()
            .filter(stock_movement::Column::BrandId.eq(brand_id))
            .order_by_desc(stock_movement::Column::CreatedAt);
        if let Some(ingredient) = ingredient_id {
            query = query.filter(stock_movement::Column::IngredientId.eq(ingredient));
        }
        if let Some(booth) = booth_id {
            query = query.filter(stock_movement::Column::BoothId.eq(booth));
        }

        let paginator = query.paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let movements = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((movements, total))
    }
}
