use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stock-keeping unit. Unique and immutable after creation.
    #[sea_orm(unique)]
    pub sku: String,

    pub name: String,
    #[serde(serialize_with = "super::money::serialize")]
    pub cost_price: Decimal,
    pub quantity: i32,
    #[serde(serialize_with = "super::money::serialize_opt")]
    pub preset_price: Option<Decimal>,

    /// Mirror of the most recent sale price recorded against this product.
    #[serde(serialize_with = "super::money::serialize_opt")]
    pub actual_price: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
