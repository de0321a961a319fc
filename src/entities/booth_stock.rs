use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-(booth, ingredient) stock triple. Invariant:
/// `remaining = allocated - used`, with `used` and `remaining` clamped
/// into `[0, allocated]` after every write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booth_stocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booth_id: Uuid,
    pub ingredient_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub allocated: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub used: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub remaining: Decimal,
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
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredientId",
        to = "super::ingredient::Column::Id"
    )]
    Ingredient,
}

impl Related<super::booth::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booth.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
