use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub order_number: String,

    /// Server-assigned, immutable after creation.
    pub created_at: DateTime<Utc>,

    /// Business-assigned transaction timestamp; reporting falls back to
    /// `created_at` when this is absent.
    pub transaction_date: Option<DateTime<Utc>>,

    pub buyer_name: Option<String>,
    #[serde(serialize_with = "super::money::serialize")]
    pub actual_price: Decimal,
    pub quantity: i32,

    /// Always derived as `actual_price * quantity - cost_price * quantity`.
    /// Never settable by callers.
    #[serde(serialize_with = "super::money::serialize")]
    pub profit: Decimal,

    pub payment_method: PaymentMethod,
    pub channel: Channel,
    pub status: OrderStatus,
    pub remark: Option<String>,

    pub product_id: i32,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    #[serde(rename = "cash")]
    Cash,
    #[sea_orm(string_value = "payid")]
    #[serde(rename = "payid")]
    Payid,
}

/// Sales channels carry the exact wire strings used by upstream exports.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Channel {
    #[sea_orm(string_value = "eBay")]
    #[serde(rename = "eBay")]
    Ebay,
    #[sea_orm(string_value = "Facebook")]
    #[serde(rename = "Facebook")]
    Facebook,
    #[sea_orm(string_value = "saltFish")]
    #[serde(rename = "saltFish")]
    SaltFish,
    #[sea_orm(string_value = "other")]
    #[serde(rename = "other")]
    Other,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    #[serde(rename = "pending")]
    Pending,
    #[sea_orm(string_value = "done")]
    #[serde(rename = "done")]
    Done,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Date used for report filtering and time-series bucketing.
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.transaction_date.unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_fields_serialize_at_two_decimal_scale() {
        // SQLite returns DECIMAL values with trailing zeros stripped; the
        // wire format must not depend on that.
        let model = Model {
            id: 1,
            order_number: "WIDGET_1".into(),
            created_at: Utc::now(),
            transaction_date: None,
            buyer_name: None,
            actual_price: dec!(15),
            quantity: 2,
            profit: dec!(10),
            payment_method: PaymentMethod::Cash,
            channel: Channel::Ebay,
            status: OrderStatus::Pending,
            remark: None,
            product_id: 1,
        };

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["actual_price"], "15.00");
        assert_eq!(json["profit"], "10.00");
    }
}
