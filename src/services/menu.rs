use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    entities::{
        booth::{self, Entity as BoothEntity},
        ingredient::Entity as IngredientEntity,
        menu_item::{self, Entity as MenuItemEntity},
        menu_item_ingredient::{self, Entity as MenuItemIngredientEntity},
    },
    errors::ServiceError,
    events::MenuEvent,
    realtime::EventBroadcaster,
};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct RecipeLineInput {
    pub ingredient_id: Uuid,
    pub quantity_per_unit: Decimal,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMenuItemInput {
    #[validate(length(min = 1))]
    pub name: String,
    pub price: Decimal,
    /// Scope to a single booth; absent means brand-wide
    pub booth_id: Option<Uuid>,
    #[serde(default)]
    pub recipe: Vec<RecipeLineInput>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateMenuItemInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub active: Option<bool>,
    /// Full replacement of the recipe when present
    pub recipe: Option<Vec<RecipeLineInput>>,
}

#[derive(Debug, Serialize)]
pub struct MenuItemWithRecipe {
    #[serde(flatten)]
    pub item: menu_item::Model,
    pub recipe: Vec<menu_item_ingredient::Model>,
}

/// Menu item and recipe management. Every mutation pushes a refreshed
/// booth menu over the menu channel.
pub struct MenuService {
    db: Arc<DatabaseConnection>,
    menu_events: Arc<EventBroadcaster>,
}

impl MenuService {
    pub fn new(db: Arc<DatabaseConnection>, menu_events: Arc<EventBroadcaster>) -> Self {
        Self { db, menu_events }
    }

    #[instrument(skip(self, user, input))]
    pub async fn create(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        input: CreateMenuItemInput,
    ) -> Result<MenuItemWithRecipe, ServiceError> {
        user.require_admin()?;
        user.require_brand(brand_id)?;
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price cannot be negative".to_string(),
            ));
        }

        let db = &*self.db;
        if let Some(booth_id) = input.booth_id {
            let booth = BoothEntity::find_by_id(booth_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Booth {booth_id} not found")))?;
            if booth.brand_id != brand_id {
                return Err(ServiceError::ValidationError(
                    "booth belongs to another brand".to_string(),
                ));
            }
        }
        self.check_recipe_ingredients(brand_id, &input.recipe).await?;

        let item_id = Uuid::new_v4();
        let now = Utc::now();
        let txn = db.begin().await?;
        let item = menu_item::ActiveModel {
            id: Set(item_id),
            brand_id: Set(brand_id),
            booth_id: Set(input.booth_id),
            name: Set(input.name),
            price: Set(input.price),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut recipe = Vec::with_capacity(input.recipe.len());
        for line in &input.recipe {
            recipe.push(
                menu_item_ingredient::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    menu_item_id: Set(item_id),
                    ingredient_id: Set(line.ingredient_id),
                    quantity_per_unit: Set(line.quantity_per_unit),
                }
                .insert(&txn)
                .await?,
            );
        }
        txn.commit().await?;

        self.broadcast_menu_refresh(brand_id, item.booth_id).await;

        Ok(MenuItemWithRecipe { item, recipe })
    }

    #[instrument(skip(self, user, input), fields(item_id = %item_id))]
    pub async fn update(
        &self,
        user: &AuthUser,
        item_id: Uuid,
        input: UpdateMenuItemInput,
    ) -> Result<MenuItemWithRecipe, ServiceError> {
        user.require_admin()?;

        let db = &*self.db;
        let found = MenuItemEntity::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {item_id} not found")))?;
        user.require_brand(found.brand_id)?;

        if let Some(recipe) = &input.recipe {
            self.check_recipe_ingredients(found.brand_id, recipe).await?;
        }

        let brand_id = found.brand_id;
        let booth_id = found.booth_id;

        let txn = db.begin().await?;
        let mut active: menu_item::ActiveModel = found.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price cannot be negative".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());
        let item = active.update(&txn).await?;

        if let Some(recipe_lines) = &input.recipe {
            MenuItemIngredientEntity::delete_many()
                .filter(menu_item_ingredient::Column::MenuItemId.eq(item_id))
                .exec(&txn)
                .await?;
            for line in recipe_lines {
                menu_item_ingredient::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    menu_item_id: Set(item_id),
                    ingredient_id: Set(line.ingredient_id),
                    quantity_per_unit: Set(line.quantity_per_unit),
                }
                .insert(&txn)
                .await?;
            }
        }
        txn.commit().await?;

        let recipe = MenuItemIngredientEntity::find()
            .filter(menu_item_ingredient::Column::MenuItemId.eq(item_id))
            .all(db)
            .await?;

        self.broadcast_menu_refresh(brand_id, booth_id).await;

        Ok(MenuItemWithRecipe { item, recipe })
    }

    #[instrument(skip(self, user), fields(item_id = %item_id))]
    pub async fn delete(&self, user: &AuthUser, item_id: Uuid) -> Result<(), ServiceError> {
        user.require_admin()?;

        let db = &*self.db;
        let found = MenuItemEntity::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {item_id} not found")))?;
        user.require_brand(found.brand_id)?;

        let txn = db.begin().await?;
        MenuItemIngredientEntity::delete_many()
            .filter(menu_item_ingredient::Column::MenuItemId.eq(item_id))
            .exec(&txn)
            .await?;
        MenuItemEntity::delete_by_id(item_id).exec(&txn).await?;
        txn.commit().await?;

        self.broadcast_menu_refresh(found.brand_id, found.booth_id).await;

        Ok(())
    }

    pub async fn get(
        &self,
        user: &AuthUser,
        item_id: Uuid,
    ) -> Result<MenuItemWithRecipe, ServiceError> {
        let db = &*self.db;
        let found = MenuItemEntity::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {item_id} not found")))?;
        user.require_brand(found.brand_id)?;

        let recipe = MenuItemIngredientEntity::find()
            .filter(menu_item_ingredient::Column::MenuItemId.eq(item_id))
            .all(db)
            .await?;

        Ok(MenuItemWithRecipe {
            item: found,
            recipe,
        })
    }

    /// Active menu for one booth: booth-scoped items plus brand-wide ones
    pub async fn booth_menu(&self, booth_id: Uuid) -> Result<Vec<menu_item::Model>, ServiceError> {
        let db = &*self.db;
        let booth = BoothEntity::find_by_id(booth_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booth {booth_id} not found")))?;

        Ok(MenuItemEntity::find()
            .filter(menu_item::Column::BrandId.eq(booth.brand_id))
            .filter(menu_item::Column::Active.eq(true))
            .filter(
                Condition::any()
                    .add(menu_item::Column::BoothId.is_null())
                    .add(menu_item::Column::BoothId.eq(booth_id)),
            )
            .order_by_asc(menu_item::Column::Name)
            .all(db)
            .await?)
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
    ) -> Result<Vec<menu_item::Model>, ServiceError> {
        user.require_brand(brand_id)?;
        Ok(MenuItemEntity::find()
            .filter(menu_item::Column::BrandId.eq(brand_id))
            .order_by_asc(menu_item::Column::Name)
            .all(&*self.db)
            .await?)
    }

    async fn check_recipe_ingredients(
        &self,
        brand_id: Uuid,
        recipe: &[RecipeLineInput],
    ) -> Result<(), ServiceError> {
        for line in recipe {
            if line.quantity_per_unit <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "recipe quantities must be positive".to_string(),
                ));
            }
            let found = IngredientEntity::find_by_id(line.ingredient_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Ingredient {} not found",
                        line.ingredient_id
                    ))
                })?;
            if found.brand_id != brand_id {
                return Err(ServiceError::ValidationError(
                    "recipe ingredient belongs to another brand".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Pushes refreshed booth menus to every connected menu client. A
    /// brand-wide item change fans out to all of the brand's booths.
    async fn broadcast_menu_refresh(&self, brand_id: Uuid, booth_id: Option<Uuid>) {
        let booths = match booth_id {
            Some(booth) => vec![booth],
            None => match BoothEntity::find()
                .filter(booth::Column::BrandId.eq(brand_id))
                .all(&*self.db)
                .await
            {
                Ok(models) => models.into_iter().map(|b| b.id).collect(),
                Err(e) => {
                    warn!(error = %e, "failed to resolve booths for menu refresh");
                    return;
                }
            },
        };

        for booth in booths {
            match self.booth_menu(booth).await {
                Ok(items) => {
                    let payload = serde_json::to_value(&items).unwrap_or_default();
                    self.menu_events
                        .broadcast_all(&MenuEvent::menu_update(booth, payload));
                }
                Err(e) => warn!(booth_id = %booth, error = %e, "failed to build booth menu"),
            }
        }
    }
}
