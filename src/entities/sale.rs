use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub brand_id: Uuid,
    pub booth_id: Uuid,
    pub cashier_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booth::Entity",
        from = "Column::BoothId",
        to = "super::booth::Column::Id"
    )]
    Booth,
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItem,
}

impl Related<super::booth::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booth.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
