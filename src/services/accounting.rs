use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    entities::accounting_transaction::{self, Entity as AccountingTransactionEntity},
    errors::ServiceError,
    services::reconciliation::TransactionKind,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountingSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Read side of the accounting ledger; writes happen at their sources
/// (reconciliation, purchases, booth setup).
pub struct AccountingService {
    db: Arc<DatabaseConnection>,
}

impl AccountingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
        kind: Option<TransactionKind>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<accounting_transaction::Model>, u64), ServiceError> {
        user.require_brand(brand_id)?;

        let mut query = AccountingTransactionEntity::find()
            .filter(accounting_transaction::Column::BrandId.eq(brand_id))
            .order_by_desc(accounting_transaction::Column::CreatedAt);
        if let Some(kind) = kind {
            query = query.filter(accounting_transaction::Column::Kind.eq(kind.to_string()));
        }

        let paginator = query.paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let transactions = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((transactions, total))
    }

    /// Income/expense totals for the brand
    #[instrument(skip(self, user))]
    pub async fn summary(
        &self,
        user: &AuthUser,
        brand_id: Uuid,
    ) -> Result<AccountingSummary, ServiceError> {
        user.require_brand(brand_id)?;

        let income = self.sum_kind(brand_id, TransactionKind::Income).await?;
        let expense = self.sum_kind(brand_id, TransactionKind::Expense).await?;

        Ok(AccountingSummary {
            income,
            expense,
            net: income - expense,
        })
    }

    async fn sum_kind(
        &self,
        brand_id: Uuid,
        kind: TransactionKind,
    ) -> Result<Decimal, ServiceError> {
        let total: Option<Option<Decimal>> = AccountingTransactionEntity::find()
            .select_only()
            .column_as(accounting_transaction::Column::Amount.sum(), "total")
            .filter(accounting_transaction::Column::BrandId.eq(brand_id))
            .filter(accounting_transaction::Column::Kind.eq(kind.to_string()))
            .into_tuple()
            .one(&*self.db)
            .await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }
}
