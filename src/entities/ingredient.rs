use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Brand-owned raw material. `stock` is the central warehouse quantity;
/// it must stay non-negative after every mutation (writes are clamped).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub unit: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_per_unit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub stock: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub minimum_stock: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id"
    )]
    Brand,
    #[sea_orm(has_many = "super::booth_stock::Entity")]
    BoothStock,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::booth_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BoothStock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
