use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AuthUser, Role},
    entities::{
        booth::{self, Entity as BoothEntity},
        menu_item::Entity as MenuItemEntity,
        sale::{self, Entity as SaleEntity},
        sale_item::{self, Entity as SaleItemEntity},
    },
    errors::ServiceError,
    events::RealtimeEvent,
    realtime::EventBroadcaster,
    services::reconciliation::{ReconciliationService, SaleLine},
};

/// Accepted payment methods at the terminal
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    QrCode,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct SaleLineInput {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateSaleInput {
    pub booth_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<SaleLineInput>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct UpdateSaleInput {
    #[validate(length(min = 1))]
    pub items: Vec<SaleLineInput>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: sale::Model,
    pub items: Vec<sale_item::Model>,
}

/// Sales terminal operations. Each mutation performs its own validated
/// primary write, answers immediately, and leaves stock and accounting
/// bookkeeping to a spawned reconciliation pass.
pub struct SaleService {
    db: Arc<DatabaseConnection>,
    events: Arc<EventBroadcaster>,
    reconciliation: Arc<ReconciliationService>,
}

impl SaleService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        events: Arc<EventBroadcaster>,
        reconciliation: Arc<ReconciliationService>,
    ) -> Self {
        Self {
            db,
            events,
            reconciliation,
        }
    }

    #[instrument(skip(self, user, input), fields(booth_id = %input.booth_id))]
    pub async fn create(
        &self,
        user: &AuthUser,
        input: CreateSaleInput,
    ) -> Result<SaleWithItems, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db;
        let booth = BoothEntity::find_by_id(input.booth_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Booth {} not found", input.booth_id)))?;
        user.require_brand(booth.brand_id)?;
        if user.role == Role::Staff && user.booth_id != Some(booth.id) {
            return Err(ServiceError::Forbidden(
                "staff may only sell at their assigned booth".to_string(),
            ));
        }

        let priced = self.price_items(&booth, &input.items).await?;
        let total: Decimal = priced.iter().map(|line| line.line_total).sum();

        let sale_id = Uuid::new_v4();
        let now = Utc::now();
        let sale_model = sale::ActiveModel {
            id: Set(sale_id),
            brand_id: Set(booth.brand_id),
            booth_id: Set(booth.id),
            cashier_id: Set(user.user_id),
            total_amount: Set(total),
            payment_method: Set(input.payment_method.to_string()),
            payment_status: Set("paid".to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let txn = db.begin().await?;
        let created = sale_model.insert(&txn).await?;
        let mut items = Vec::with_capacity(priced.len());
        for line in &priced {
            let item = sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                menu_item_id: Set(line.menu_item_id),
                name: Set(line.name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total),
            };
            items.push(item.insert(&txn).await?);
        }
        txn.commit().await?;

        let response = SaleWithItems {
            sale: created.clone(),
            items,
        };

        self.events.broadcast(&RealtimeEvent::new_sale(
            created.brand_id,
            created.booth_id,
            serde_json::to_value(&response).unwrap_or_default(),
        ));

        // Bookkeeping runs after the response; its failures are logged,
        // never surfaced to the terminal.
        let reconciliation = self.reconciliation.clone();
        let lines = to_sale_lines(&input.items);
        let actor = user.user_id;
        let sale_for_recon = created;
        tokio::spawn(async move {
            let outcome = reconciliation
                .apply_sale(&sale_for_recon, &lines, actor)
                .await;
            outcome.log("sale_create", sale_for_recon.id);
        });

        Ok(response)
    }

    #[instrument(skip(self, user, input), fields(sale_id = %sale_id))]
    pub async fn update(
        &self,
        user: &AuthUser,
        sale_id: Uuid,
        input: UpdateSaleInput,
    ) -> Result<SaleWithItems, ServiceError> {
        input
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        user.require_admin()?;

        let db = &*self.db;
        let existing = SaleEntity::find_by_id(sale_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {sale_id} not found")))?;
        user.require_brand(existing.brand_id)?;

        let booth = BoothEntity::find_by_id(existing.booth_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Booth {} not found", existing.booth_id))
            })?;

        let original_items = SaleItemEntity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(db)
            .await?;
        let original_lines: Vec<SaleLine> = original_items
            .iter()
            .map(|item| SaleLine {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
            })
            .collect();

        let priced = self.price_items(&booth, &input.items).await?;
        let total: Decimal = priced.iter().map(|line| line.line_total).sum();

        let txn = db.begin().await?;
        SaleItemEntity::delete_many()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .exec(&txn)
            .await?;
        let mut items = Vec::with_capacity(priced.len());
        for line in &priced {
            let item = sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                menu_item_id: Set(line.menu_item_id),
                name: Set(line.name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total),
            };
            items.push(item.insert(&txn).await?);
        }

        let mut active: sale::ActiveModel = existing.into();
        active.total_amount = Set(total);
        if let Some(method) = input.payment_method {
            active.payment_method = Set(method.to_string());
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        let reconciliation = self.reconciliation.clone();
        let new_lines = to_sale_lines(&input.items);
        let actor = user.user_id;
        let sale_for_recon = updated.clone();
        tokio::spawn(async move {
            let outcome = reconciliation
                .apply_sale_edit(&sale_for_recon, &original_lines, &new_lines, actor)
                .await;
            outcome.log("sale_edit", sale_for_recon.id);
        });

        Ok(SaleWithItems {
            sale: updated,
            items,
        })
    }

    /// Deletes a sale. The response is immediate; reversal of stock and
    /// accounting effects, and the row deletions themselves, run in the
    /// spawned reconciliation pass.
    #[instrument(skip(self, user), fields(sale_id = %sale_id))]
    pub async fn delete(&self, user: &AuthUser, sale_id: Uuid) -> Result<(), ServiceError> {
        user.require_admin()?;

        let db = &*self.db;
        let existing = SaleEntity::find_by_id(sale_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {sale_id} not found")))?;
        user.require_brand(existing.brand_id)?;

        let items = SaleItemEntity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(db)
            .await?;
        let lines: Vec<SaleLine> = items
            .iter()
            .map(|item| SaleLine {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
            })
            .collect();

        let reconciliation = self.reconciliation.clone();
        let actor = user.user_id;
        tokio::spawn(async move {
            let outcome = reconciliation
                .reverse_and_delete_sale(&existing, &lines, actor)
                .await;
            outcome.log("sale_delete", existing.id);
        });

        Ok(())
    }

    pub async fn get(&self, user: &AuthUser, sale_id: Uuid) -> Result<SaleWithItems, ServiceError> {
        let db = &*self.db;
        let found = SaleEntity::find_by_id(sale_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {sale_id} not found")))?;
        user.require_brand(found.brand_id)?;

        let items = SaleItemEntity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(db)
            .await?;

        Ok(SaleWithItems { sale: found, items })
    }

    /// Lists sales for a brand, newest first. Staff only see their booth.
    pub async fn list(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        booth_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<sale::Model>, u64), ServiceError> {
        user.require_brand(brand_id)?;
        let booth_filter = if user.role == Role::Staff {
            user.booth_id
        } else {
            booth_id
        };

        let mut query = SaleEntity::find()
            .filter(sale::Column::BrandId.eq(brand_id))
            .order_by_desc(sale::Column::CreatedAt);
        if let Some(booth) = booth_filter {
            query = query.filter(sale::Column::BoothId.eq(booth));
        }

        let paginator = query.paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let sales = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((sales, total))
    }

    /// Resolves menu items and captures the current prices for each line.
    async fn price_items(
        &self,
        booth: &booth::Model,
        items: &[SaleLineInput],
    ) -> Result<Vec<PricedLine>, ServiceError> {
        let db = &*self.db;
        let mut priced = Vec::with_capacity(items.len());

        for line in items {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "line quantity must be positive".to_string(),
                ));
            }

            let item = MenuItemEntity::find_by_id(line.menu_item_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Menu item {} not found", line.menu_item_id))
                })?;

            if item.brand_id != booth.brand_id || !item.active {
                return Err(ServiceError::ValidationError(format!(
                    "menu item {} is not sellable at this booth",
                    item.id
                )));
            }
            if let Some(item_booth) = item.booth_id {
                if item_booth != booth.id {
                    return Err(ServiceError::ValidationError(format!(
                        "menu item {} belongs to another booth",
                        item.id
                    )));
                }
            }

            let line_total = item.price * Decimal::from(line.quantity);
            priced.push(PricedLine {
                menu_item_id: item.id,
                name: item.name,
                quantity: line.quantity,
                unit_price: item.price,
                line_total,
            });
        }

        Ok(priced)
    }
}

struct PricedLine {
    menu_item_id: Uuid,
    name: String,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
}

fn to_sale_lines(items: &[SaleLineInput]) -> Vec<SaleLine> {
    items
        .iter()
        .map(|line| SaleLine {
            menu_item_id: line.menu_item_id,
            quantity: line.quantity,
        })
        .collect()
}
