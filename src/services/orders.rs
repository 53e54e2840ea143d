use crate::{
    db::DbPool,
    entities::order::{
        self, ActiveModel as OrderActiveModel, Channel, Entity as OrderEntity, Model as OrderModel,
        OrderStatus, PaymentMethod,
    },
    entities::product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity},
    errors::ServiceError,
    services::ensure_non_negative,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// Caller-supplied order number, or derived as `{sku}_{N}` when absent.
    pub order_number: Option<String>,
    #[validate(length(min = 1, message = "Product SKU is required"))]
    pub product_sku: String,
    pub actual_price: Decimal,
    pub quantity: i32,
    pub payment_method: PaymentMethod,
    pub channel: Channel,
    pub status: OrderStatus,
    pub transaction_date: Option<DateTime<Utc>>,
    pub buyer_name: Option<String>,
    pub remark: Option<String>,
}

/// Explicit-presence patch: an absent field is left untouched; for nullable
/// fields, JSON `null` deserializes to `Some(None)` and clears the value.
/// A caller-supplied `profit` is never honored; profit is always rederived.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OrderPatch {
    pub actual_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub payment_method: Option<PaymentMethod>,
    pub channel: Option<Channel>,
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "crate::services::double_option")]
    pub transaction_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "crate::services::double_option")]
    pub buyer_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::services::double_option")]
    pub remark: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderBatchResult {
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub total_processed: usize,
}

/// Ledger of sales orders. Every mutation keeps product stock and order
/// profit consistent inside a single transaction: creation reserves stock,
/// quantity updates move the delta, deletion restocks.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

/// `actual_price * quantity - cost_price * quantity`, exact decimal.
pub fn compute_profit(actual_price: Decimal, cost_price: Decimal, quantity: i32) -> Decimal {
    (actual_price - cost_price) * Decimal::from(quantity)
}

/// Next order number for a product: one past the highest numeric suffix among
/// the product's existing `{sku}_{N}` order numbers. Malformed suffixes are
/// ignored, not errors.
fn next_order_number(sku: &str, existing: &[String]) -> String {
    let prefix = format!("{sku}_");
    let max = existing
        .iter()
        .filter_map(|number| number.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}_{}", sku, max + 1)
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn validate_create(request: &CreateOrderRequest) -> Result<(), ServiceError> {
        request.validate()?;
        ensure_non_negative("actual_price", request.actual_price)?;
        if request.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Creates an order: resolves the product, checks stock, derives profit,
    /// decrements stock, and mirrors the sale price onto the product. Order
    /// insert and product update commit as one atomic unit.
    #[instrument(skip(self, request), fields(product_sku = %request.product_sku))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderModel, ServiceError> {
        Self::validate_create(&request)?;

        let db = &*self.db_pool;
        let txn = db.begin().await?;
        let order = self.create_order_in(&txn, request).await?;
        txn.commit().await?;

        info!(order_id = order.id, order_number = %order.order_number, "Order created");
        Ok(order)
    }

    async fn create_order_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        request: CreateOrderRequest,
    ) -> Result<OrderModel, ServiceError> {
        // SELECT ... FOR UPDATE: holds the product row until commit so a
        // concurrent order on the same product cannot pass the stock check
        // against a stale quantity. SQLite serializes writes anyway and its
        // query builder drops the lock clause.
        let product_model = ProductEntity::find()
            .filter(product::Column::Sku.eq(request.product_sku.clone()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(request.product_sku.clone()))?;

        if product_model.quantity < request.quantity {
            return Err(ServiceError::InsufficientStock(format!(
                "requested {} of {}, only {} available",
                request.quantity, product_model.sku, product_model.quantity
            )));
        }

        let order_number = match request.order_number {
            Some(number) => {
                let exists = OrderEntity::find()
                    .filter(order::Column::OrderNumber.eq(number.clone()))
                    .one(conn)
                    .await?
                    .is_some();
                if exists {
                    return Err(ServiceError::DuplicateOrderNumber(number));
                }
                number
            }
            None => {
                let existing: Vec<String> = OrderEntity::find()
                    .select_only()
                    .column(order::Column::OrderNumber)
                    .filter(order::Column::ProductId.eq(product_model.id))
                    .into_tuple()
                    .all(conn)
                    .await?;
                next_order_number(&product_model.sku, &existing)
            }
        };

        let profit = compute_profit(
            request.actual_price,
            product_model.cost_price,
            request.quantity,
        );

        let product_id = product_model.id;
        let remaining = product_model.quantity - request.quantity;

        let mut product_active: ProductActiveModel = product_model.into();
        product_active.quantity = Set(remaining);
        product_active.actual_price = Set(Some(request.actual_price));
        product_active.update(conn).await?;

        let order_model = OrderActiveModel {
            order_number: Set(order_number),
            created_at: Set(Utc::now()),
            transaction_date: Set(request.transaction_date),
            buyer_name: Set(request.buyer_name),
            actual_price: Set(request.actual_price),
            quantity: Set(request.quantity),
            profit: Set(profit),
            payment_method: Set(request.payment_method),
            channel: Set(request.channel),
            status: Set(request.status),
            remark: Set(request.remark),
            product_id: Set(product_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        Ok(order_model)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;
        OrderEntity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_order_by_number(&self, order_number: &str) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;
        OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound(order_number.to_string()))
    }

    /// Lists orders, most recently created first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderModel>, ServiceError> {
        let db = &*self.db_pool;
        Ok(OrderEntity::find()
            .order_by_desc(order::Column::Id)
            .all(db)
            .await?)
    }

    /// Applies a partial update. A quantity change moves the stock delta
    /// against the product (failing with `InsufficientStock` when the
    /// increase exceeds available stock); profit is rederived from the
    /// resulting price and quantity afterwards.
    #[instrument(skip(self, patch), fields(order_id = order_id))]
    pub async fn update_order(&self, order_id: i32, patch: OrderPatch) -> Result<OrderModel, ServiceError> {
        if let Some(actual_price) = patch.actual_price {
            ensure_non_negative("actual_price", actual_price)?;
        }
        if let Some(quantity) = patch.quantity {
            if quantity < 1 {
                return Err(ServiceError::ValidationError(
                    "quantity must be at least 1".into(),
                ));
            }
        }

        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))?;

        let product_model = ProductEntity::find_by_id(order_model.product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ProductNotFound(format!("id {}", order_model.product_id))
            })?;

        let old_quantity = order_model.quantity;
        let cost_price = product_model.cost_price;

        if let Some(new_quantity) = patch.quantity {
            let diff = new_quantity - old_quantity;
            if diff > 0 && product_model.quantity < diff {
                return Err(ServiceError::InsufficientStock(format!(
                    "increase of {} for {} exceeds available {}",
                    diff, product_model.sku, product_model.quantity
                )));
            }
            if diff != 0 {
                let remaining = product_model.quantity - diff;
                let mut product_active: ProductActiveModel = product_model.into();
                product_active.quantity = Set(remaining);
                product_active.update(&txn).await?;
            }
        }

        let mut active: OrderActiveModel = order_model.into();

        if let Some(actual_price) = patch.actual_price {
            active.actual_price = Set(actual_price);
        }
        if let Some(quantity) = patch.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(payment_method) = patch.payment_method {
            active.payment_method = Set(payment_method);
        }
        if let Some(channel) = patch.channel {
            active.channel = Set(channel);
        }
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        if let Some(transaction_date) = patch.transaction_date {
            active.transaction_date = Set(transaction_date);
        }
        if let Some(buyer_name) = patch.buyer_name {
            active.buyer_name = Set(buyer_name);
        }
        if let Some(remark) = patch.remark {
            active.remark = Set(remark);
        }

        // Profit is never taken from the caller.
        let final_price = active.actual_price.clone().unwrap();
        let final_quantity = active.quantity.clone().unwrap();
        active.profit = Set(compute_profit(final_price, cost_price, final_quantity));

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(order_id = updated.id, "Order updated");
        Ok(updated)
    }

    /// Deletes an order, restoring exactly the order's quantity to its
    /// product before removal. Restock always happens.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let order_model = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::OrderNotFound(order_id.to_string()))?;

        let product_model = ProductEntity::find_by_id(order_model.product_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ProductNotFound(format!("id {}", order_model.product_id))
            })?;

        let restored = product_model.quantity + order_model.quantity;
        let mut product_active: ProductActiveModel = product_model.into();
        product_active.quantity = Set(restored);
        product_active.update(&txn).await?;

        let order_number = order_model.order_number.clone();
        order_model.delete(&txn).await?;
        txn.commit().await?;

        info!(order_id = order_id, order_number = %order_number, "Order deleted, stock restored");
        Ok(())
    }

    /// Upserts a batch of orders. Rows whose order number already exists are
    /// skipped; row-level failures (unknown product, insufficient stock) are
    /// collected as error strings and do not abort the batch. Each row
    /// commits independently.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn upsert_batch(&self, rows: Vec<CreateOrderRequest>) -> Result<OrderBatchResult, ServiceError> {
        let db = &*self.db_pool;
        let mut inserted = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for row in rows {
            let label = row
                .order_number
                .clone()
                .unwrap_or_else(|| format!("<auto:{}>", row.product_sku));

            if let Some(number) = &row.order_number {
                let exists = OrderEntity::find()
                    .filter(order::Column::OrderNumber.eq(number.clone()))
                    .one(db)
                    .await?
                    .is_some();
                if exists {
                    skipped += 1;
                    continue;
                }
            }

            let outcome = async {
                Self::validate_create(&row)?;
                let txn = db.begin().await?;
                let order = self.create_order_in(&txn, row).await?;
                txn.commit().await?;
                Ok::<_, ServiceError>(order)
            }
            .await;

            match outcome {
                Ok(_) => inserted += 1,
                Err(err) => {
                    warn!(order_number = %label, error = %err, "Batch row failed");
                    errors.push(format!("{}: {}", label, err));
                }
            }
        }

        let total_processed = inserted + skipped + errors.len();
        info!(
            inserted = inserted,
            skipped = skipped,
            errors = errors.len(),
            "Order batch upsert complete"
        );
        Ok(OrderBatchResult {
            inserted,
            skipped,
            errors,
            total_processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn profit_is_price_minus_cost_times_quantity() {
        assert_eq!(compute_profit(dec!(15.00), dec!(10.00), 2), dec!(10.00));
        assert_eq!(compute_profit(dec!(8.00), dec!(10.00), 3), dec!(-6.00));
        assert_eq!(compute_profit(dec!(9.99), dec!(9.99), 5), dec!(0.00));
    }

    #[test]
    fn order_number_derives_from_max_numeric_suffix() {
        let existing = vec![
            "WIDGET_1".to_string(),
            "WIDGET_7".to_string(),
            "WIDGET_3".to_string(),
        ];
        assert_eq!(next_order_number("WIDGET", &existing), "WIDGET_8");
    }

    #[test]
    fn malformed_suffixes_are_ignored() {
        let existing = vec![
            "WIDGET_2".to_string(),
            "WIDGET_abc".to_string(),
            "WIDGET_".to_string(),
            "OTHER_99".to_string(),
        ];
        assert_eq!(next_order_number("WIDGET", &existing), "WIDGET_3");
    }

    #[test]
    fn first_order_number_starts_at_one() {
        assert_eq!(next_order_number("WIDGET", &[]), "WIDGET_1");
    }

    #[test]
    fn patch_null_clears_nullable_fields() {
        let patch: OrderPatch = serde_json::from_str(r#"{"buyer_name": null}"#).unwrap();
        assert_eq!(patch.buyer_name, Some(None));
        assert_eq!(patch.remark, None);
    }
}
