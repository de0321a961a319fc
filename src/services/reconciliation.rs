use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{
        accounting_transaction::{self, Entity as AccountingTransactionEntity},
        booth_stock::{self, Entity as BoothStockEntity},
        ingredient::{self, Entity as IngredientEntity},
        menu_item_ingredient::{self, Entity as MenuItemIngredientEntity},
        sale::{self, Entity as SaleEntity},
        sale_item::{self, Entity as SaleItemEntity},
        stock_movement,
    },
    errors::ServiceError,
    events::RealtimeEvent,
    realtime::EventBroadcaster,
};

/// Types of stock movements recorded in the audit ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Use,
    Waste,
    Adjustment,
}

/// Accounting ledger entry kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

pub const SALE_RELATED_TYPE: &str = "sale";
pub const SALE_REVENUE_CATEGORY: &str = "sale_revenue";

/// Booth-stock low-water fraction of the allocated quantity
const LOW_STOCK_FRACTION: Decimal = dec!(0.2);

/// Per-(booth, ingredient) async locks serializing every stock
/// read-modify-write, so concurrent sales against the same pair cannot
/// lose updates. Shared between reconciliation and booth allocation.
#[derive(Default)]
pub struct StockLocks {
    locks: DashMap<(Uuid, Uuid), Arc<Mutex<()>>>,
}

impl StockLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, booth_id: Uuid, ingredient_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let entry = self
                .locks
                .entry((booth_id, ingredient_id))
                .or_default();
            Arc::clone(entry.value())
        };
        lock.lock_owned().await
    }
}

/// A validated sale line as reconciliation sees it
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

/// Result of one reconciliation pass. The HTTP request that triggered
/// the pass has already succeeded; the spawning task logs this outcome
/// and nothing else observes it.
#[derive(Debug)]
pub enum ReconciliationOutcome {
    Completed { ingredients_touched: usize },
    RetryableFailure(ServiceError),
    PermanentFailure(ServiceError),
}

impl ReconciliationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn log(&self, operation: &str, sale_id: Uuid) {
        match self {
            Self::Completed {
                ingredients_touched,
            } => {
                info!(
                    %sale_id,
                    operation,
                    ingredients_touched,
                    "stock reconciliation completed"
                );
            }
            Self::RetryableFailure(err) => {
                warn!(%sale_id, operation, error = %err, "stock reconciliation failed (retryable)");
            }
            Self::PermanentFailure(err) => {
                error!(%sale_id, operation, error = %err, "stock reconciliation failed (permanent)");
            }
        }
    }
}

fn classify(err: ServiceError) -> ReconciliationOutcome {
    match err {
        ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => {
            ReconciliationOutcome::RetryableFailure(err)
        }
        other => ReconciliationOutcome::PermanentFailure(other),
    }
}

/// Post-sale stock and accounting reconciliation.
///
/// Runs after the sale-mutating write has already succeeded and never
/// fails the triggering request: callers spawn it and log the outcome.
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    events: Arc<EventBroadcaster>,
    locks: Arc<StockLocks>,
}

impl ReconciliationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        events: Arc<EventBroadcaster>,
        locks: Arc<StockLocks>,
    ) -> Self {
        Self { db, events, locks }
    }

    /// Applies a newly created sale: booth-stock consumption, `use`
    /// movements, stock-update and low-stock events, and the linked
    /// revenue transaction.
    #[instrument(skip(self, sale, items), fields(sale_id = %sale.id))]
    pub async fn apply_sale(
        &self,
        sale: &sale::Model,
        items: &[SaleLine],
        actor: Uuid,
    ) -> ReconciliationOutcome {
        match self.apply_sale_inner(sale, items, actor).await {
            Ok(touched) => ReconciliationOutcome::Completed {
                ingredients_touched: touched,
            },
            Err(err) => classify(err),
        }
    }

    async fn apply_sale_inner(
        &self,
        sale: &sale::Model,
        items: &[SaleLine],
        actor: Uuid,
    ) -> Result<usize, ServiceError> {
        let db = &*self.db;
        let usage = self.usage_per_ingredient(items).await?;

        for (&ingredient_id, &total_used) in &usage {
            let _guard = self.locks.acquire(sale.booth_id, ingredient_id).await;

            let ingredient = IngredientEntity::find_by_id(ingredient_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Ingredient {ingredient_id} not found"))
                })?;

            self.consume_booth_stock(sale, &ingredient, total_used).await?;

            self.record_movement(
                sale.brand_id,
                ingredient_id,
                Some(sale.booth_id),
                Some(sale.id),
                MovementType::Use,
                -total_used,
                None,
                Some(actor),
            )
            .await?;
        }

        // Revenue entry mirroring the sale total, linked for later edits
        let transaction = accounting_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(sale.brand_id),
            booth_id: Set(Some(sale.booth_id)),
            kind: Set(TransactionKind::Income.to_string()),
            category: Set(SALE_REVENUE_CATEGORY.to_string()),
            amount: Set(sale.total_amount),
            description: Set(None),
            related_id: Set(Some(sale.id)),
            related_type: Set(Some(SALE_RELATED_TYPE.to_string())),
            created_by: Set(Some(actor)),
            created_at: Set(Utc::now().into()),
        };
        transaction.insert(db).await?;

        Ok(usage.len())
    }

    /// Applies a sale edit: the net per-ingredient delta between the
    /// original and new line items goes back into central stock, the
    /// booth triple moves inversely, and the linked revenue transaction
    /// is synced to the new total.
    #[instrument(skip(self, sale, original_items, new_items), fields(sale_id = %sale.id))]
    pub async fn apply_sale_edit(
        &self,
        sale: &sale::Model,
        original_items: &[SaleLine],
        new_items: &[SaleLine],
        actor: Uuid,
    ) -> ReconciliationOutcome {
        match self
            .apply_sale_edit_inner(sale, original_items, new_items, actor)
            .await
        {
            Ok(touched) => ReconciliationOutcome::Completed {
                ingredients_touched: touched,
            },
            Err(err) => classify(err),
        }
    }

    async fn apply_sale_edit_inner(
        &self,
        sale: &sale::Model,
        original_items: &[SaleLine],
        new_items: &[SaleLine],
        actor: Uuid,
    ) -> Result<usize, ServiceError> {
        let db = &*self.db;

        // Two passes into one signed accumulator: reversing the original
        // items adds stock back, applying the new items consumes it.
        let mut change: HashMap<Uuid, Decimal> = HashMap::new();
        for (ingredient_id, used) in self.usage_per_ingredient(original_items).await? {
            *change.entry(ingredient_id).or_default() += used;
        }
        for (ingredient_id, used) in self.usage_per_ingredient(new_items).await? {
            *change.entry(ingredient_id).or_default() -= used;
        }

        let mut touched = 0usize;
        for (&ingredient_id, &delta) in &change {
            if delta.is_zero() {
                continue;
            }
            touched += 1;

            let _guard = self.locks.acquire(sale.booth_id, ingredient_id).await;

            let ingredient = IngredientEntity::find_by_id(ingredient_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Ingredient {ingredient_id} not found"))
                })?;

            // Central stock absorbs the net change, clamped at zero
            let new_stock = (ingredient.stock + delta).max(Decimal::ZERO);
            let mut active: ingredient::ActiveModel = ingredient.clone().into();
            active.stock = Set(new_stock);
            active.updated_at = Set(Utc::now().into());
            active.update(db).await?;

            self.record_movement(
                sale.brand_id,
                ingredient_id,
                Some(sale.booth_id),
                Some(sale.id),
                MovementType::Adjustment,
                delta,
                Some("sale edit net change".to_string()),
                Some(actor),
            )
            .await?;

            // Booth triple moves inversely: restored stock means less used
            self.shift_booth_usage(sale, &ingredient, -delta).await?;
        }

        self.sync_sale_transaction(sale, actor).await?;

        Ok(touched)
    }

    /// Fully reverses a sale and removes it: stock restoration,
    /// restoration movements, linked-record cleanup, then the sale rows
    /// themselves.
    #[instrument(skip(self, sale, items), fields(sale_id = %sale.id))]
    pub async fn reverse_and_delete_sale(
        &self,
        sale: &sale::Model,
        items: &[SaleLine],
        actor: Uuid,
    ) -> ReconciliationOutcome {
        match self.reverse_and_delete_sale_inner(sale, items, actor).await {
            Ok(touched) => ReconciliationOutcome::Completed {
                ingredients_touched: touched,
            },
            Err(err) => classify(err),
        }
    }

    async fn reverse_and_delete_sale_inner(
        &self,
        sale: &sale::Model,
        items: &[SaleLine],
        actor: Uuid,
    ) -> Result<usize, ServiceError> {
        let db = &*self.db;
        let usage = self.usage_per_ingredient(items).await?;

        for (&ingredient_id, &total_used) in &usage {
            let _guard = self.locks.acquire(sale.booth_id, ingredient_id).await;

            let ingredient = IngredientEntity::find_by_id(ingredient_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Ingredient {ingredient_id} not found"))
                })?;

            let new_stock = (ingredient.stock + total_used).max(Decimal::ZERO);
            let mut active: ingredient::ActiveModel = ingredient.clone().into();
            active.stock = Set(new_stock);
            active.updated_at = Set(Utc::now().into());
            active.update(db).await?;

            // Restoration entry is not tagged with the sale id so it
            // survives the ledger cleanup below
            self.record_movement(
                sale.brand_id,
                ingredient_id,
                Some(sale.booth_id),
                None,
                MovementType::Adjustment,
                total_used,
                Some(format!("restored from deleted sale {}", sale.id)),
                Some(actor),
            )
            .await?;

            self.shift_booth_usage(sale, &ingredient, -total_used).await?;
        }

        AccountingTransactionEntity::delete_many()
            .filter(accounting_transaction::Column::RelatedId.eq(sale.id))
            .filter(accounting_transaction::Column::RelatedType.eq(SALE_RELATED_TYPE))
            .exec(db)
            .await?;

        stock_movement::Entity::delete_many()
            .filter(stock_movement::Column::SaleId.eq(sale.id))
            .exec(db)
            .await?;

        SaleItemEntity::delete_many()
            .filter(sale_item::Column::SaleId.eq(sale.id))
            .exec(db)
            .await?;
        SaleEntity::delete_by_id(sale.id).exec(db).await?;

        Ok(usage.len())
    }

    /// Expands sale lines into total ingredient usage via each menu
    /// item's recipe, accumulating by ingredient id.
    async fn usage_per_ingredient(
        &self,
        items: &[SaleLine],
    ) -> Result<HashMap<Uuid, Decimal>, ServiceError> {
        let db = &*self.db;
        let mut usage: HashMap<Uuid, Decimal> = HashMap::new();

        for line in items {
            let recipe = MenuItemIngredientEntity::find()
                .filter(menu_item_ingredient::Column::MenuItemId.eq(line.menu_item_id))
                .all(db)
                .await?;

            for row in recipe {
                let total = row.quantity_per_unit * Decimal::from(line.quantity);
                *usage.entry(row.ingredient_id).or_default() += total;
            }
        }

        Ok(usage)
    }

    /// Applies consumption to the booth triple and emits stock events.
    async fn consume_booth_stock(
        &self,
        sale: &sale::Model,
        ingredient: &ingredient::Model,
        total_used: Decimal,
    ) -> Result<(), ServiceError> {
        self.shift_booth_usage_with_alerts(sale, ingredient, total_used, true)
            .await
    }

    /// Moves the booth triple's `used` by `used_delta` (positive means
    /// more consumed), recomputes `remaining`, clamps both into
    /// `[0, allocated]`, and broadcasts the stock update.
    async fn shift_booth_usage(
        &self,
        sale: &sale::Model,
        ingredient: &ingredient::Model,
        used_delta: Decimal,
    ) -> Result<(), ServiceError> {
        self.shift_booth_usage_with_alerts(sale, ingredient, used_delta, false)
            .await
    }

    async fn shift_booth_usage_with_alerts(
        &self,
        sale: &sale::Model,
        ingredient: &ingredient::Model,
        used_delta: Decimal,
        check_low_stock: bool,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;

        let Some(stock) = BoothStockEntity::find()
            .filter(booth_stock::Column::BoothId.eq(sale.booth_id))
            .filter(booth_stock::Column::IngredientId.eq(ingredient.id))
            .one(db)
            .await?
        else {
            warn!(
                booth_id = %sale.booth_id,
                ingredient_id = %ingredient.id,
                "no booth stock allocated for consumed ingredient"
            );
            return Ok(());
        };

        let allocated = stock.allocated;
        let old_remaining = stock.remaining;
        let new_used = (stock.used + used_delta).clamp(Decimal::ZERO, allocated);
        let new_remaining = (allocated - new_used).clamp(Decimal::ZERO, allocated);

        let mut active: booth_stock::ActiveModel = stock.into();
        active.used = Set(new_used);
        active.remaining = Set(new_remaining);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;

        self.events.broadcast(&RealtimeEvent::stock_update(
            sale.brand_id,
            sale.booth_id,
            ingredient.id,
            &ingredient.name,
            old_remaining,
            new_remaining,
        ));

        if check_low_stock {
            let threshold = (allocated * LOW_STOCK_FRACTION).max(ingredient.minimum_stock);
            if new_remaining <= threshold {
                self.events.broadcast_to_brand(
                    sale.brand_id,
                    &RealtimeEvent::low_stock_alert(
                        sale.brand_id,
                        Some(sale.booth_id),
                        ingredient.id,
                        &ingredient.name,
                        new_remaining,
                        ingredient.minimum_stock,
                    ),
                );
            }
        }

        Ok(())
    }

    /// Keeps the sale-linked revenue transaction equal to the sale's
    /// current total, creating it when absent.
    async fn sync_sale_transaction(
        &self,
        sale: &sale::Model,
        actor: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;

        let existing = AccountingTransactionEntity::find()
            .filter(accounting_transaction::Column::RelatedId.eq(sale.id))
            .filter(accounting_transaction::Column::RelatedType.eq(SALE_RELATED_TYPE))
            .one(db)
            .await?;

        match existing {
            Some(transaction) => {
                let mut active: accounting_transaction::ActiveModel = transaction.into();
                active.amount = Set(sale.total_amount);
                active.update(db).await?;
            }
            None => {
                let transaction = accounting_transaction::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    brand_id: Set(sale.brand_id),
                    booth_id: Set(Some(sale.booth_id)),
                    kind: Set(TransactionKind::Income.to_string()),
                    category: Set(SALE_REVENUE_CATEGORY.to_string()),
                    amount: Set(sale.total_amount),
                    description: Set(None),
                    related_id: Set(Some(sale.id)),
                    related_type: Set(Some(SALE_RELATED_TYPE.to_string())),
                    created_by: Set(Some(actor)),
                    created_at: Set(Utc::now().into()),
                };
                transaction.insert(db).await?;
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_movement(
        &self,
        brand_id: Uuid,
        ingredient_id: Uuid,
        booth_id: Option<Uuid>,
        sale_id: Option<Uuid>,
        movement_type: MovementType,
        quantity: Decimal,
        note: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let movement = stock_movement::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(brand_id),
            ingredient_id: Set(ingredient_id),
            booth_id: Set(booth_id),
            sale_id: Set(sale_id),
            movement_type: Set(movement_type.to_string()),
            quantity: Set(quantity),
            note: Set(note),
            created_by: Set(created_by),
            created_at: Set(Utc::now().into()),
        };
        movement.insert(&*self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_types_serialize_snake_case() {
        assert_eq!(MovementType::Use.to_string(), "use");
        assert_eq!(MovementType::Adjustment.to_string(), "adjustment");
        assert_eq!("purchase".parse::<MovementType>().unwrap(), MovementType::Purchase);
    }

    #[test]
    fn retryable_and_permanent_failures_split_on_error_kind() {
        let db_err = ServiceError::DatabaseError(sea_orm::DbErr::Custom("gone".into()));
        assert!(matches!(
            classify(db_err),
            ReconciliationOutcome::RetryableFailure(_)
        ));

        let missing = ServiceError::NotFound("ingredient".into());
        assert!(matches!(
            classify(missing),
            ReconciliationOutcome::PermanentFailure(_)
        ));
    }
}
