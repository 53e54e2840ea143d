use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity},
    entities::product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity, Model as ProductModel},
    errors::ServiceError,
    services::ensure_non_negative,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU is required"))]
    pub sku: String,

    /// When true, `sku` is treated as a prefix and the ledger assigns
    /// `{prefix}_{NNN}` from the count of existing `{prefix}_*` SKUs.
    #[serde(default)]
    pub sku_is_prefix: bool,

    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    pub cost_price: Decimal,
    pub quantity: i32,
    pub preset_price: Option<Decimal>,
    pub actual_price: Option<Decimal>,
}

/// Explicit-presence patch: an absent field is left untouched; for nullable
/// fields, JSON `null` deserializes to `Some(None)` and clears the value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub cost_price: Option<Decimal>,
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "crate::services::double_option")]
    pub preset_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "crate::services::double_option")]
    pub actual_price: Option<Option<Decimal>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cost_price.is_none()
            && self.quantity.is_none()
            && self.preset_price.is_none()
            && self.actual_price.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductBatchResult {
    pub inserted: usize,
    pub updated: usize,
}

/// Ledger of product records: SKU assignment, stock quantities, and the
/// cascading profit recompute on cost-price changes.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn validate_prices(
        cost_price: Decimal,
        quantity: i32,
        preset_price: Option<Decimal>,
        actual_price: Option<Decimal>,
    ) -> Result<(), ServiceError> {
        ensure_non_negative("cost_price", cost_price)?;
        if quantity < 0 {
            return Err(ServiceError::ValidationError(
                "quantity must not be negative".into(),
            ));
        }
        if let Some(preset) = preset_price {
            ensure_non_negative("preset_price", preset)?;
        }
        if let Some(actual) = actual_price {
            ensure_non_negative("actual_price", actual)?;
        }
        Ok(())
    }

    /// Creates a product. With `sku_is_prefix` the final SKU is derived from
    /// the prefix plus a zero-padded sequence; a literal SKU that already
    /// exists fails with `DuplicateSku`.
    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        request.validate()?;
        Self::validate_prices(
            request.cost_price,
            request.quantity,
            request.preset_price,
            request.actual_price,
        )?;

        let db = &*self.db_pool;

        let sku = if request.sku_is_prefix {
            self.derive_sku_from_prefix(&request.sku).await?
        } else {
            let existing = ProductEntity::find()
                .filter(product::Column::Sku.eq(request.sku.clone()))
                .one(db)
                .await?;
            if existing.is_some() {
                return Err(ServiceError::DuplicateSku(request.sku));
            }
            request.sku.clone()
        };

        let model = ProductActiveModel {
            sku: Set(sku.clone()),
            name: Set(request.name),
            cost_price: Set(request.cost_price),
            quantity: Set(request.quantity),
            preset_price: Set(request.preset_price),
            actual_price: Set(request.actual_price),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, sku = %sku, "Failed to insert product");
            ServiceError::from(e)
        })?;

        info!(sku = %model.sku, product_id = model.id, "Product created");
        Ok(model)
    }

    /// Assigns `{prefix}_{NNN}` where NNN is one past the count of existing
    /// SKUs matching `{prefix}_*`, zero-padded to 3 digits.
    async fn derive_sku_from_prefix(&self, prefix: &str) -> Result<String, ServiceError> {
        let db = &*self.db_pool;
        let count = ProductEntity::find()
            .filter(product::Column::Sku.starts_with(format!("{prefix}_")))
            .count(db)
            .await?;
        Ok(format!("{}_{:03}", prefix, count + 1))
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_sku(&self, sku: &str) -> Result<ProductModel, ServiceError> {
        let db = &*self.db_pool;
        ProductEntity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(sku.to_string()))
    }

    /// Lists products, most recently created first.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductModel>, ServiceError> {
        let db = &*self.db_pool;
        Ok(ProductEntity::find()
            .order_by_desc(product::Column::Id)
            .all(db)
            .await?)
    }

    /// Applies a partial update. When `cost_price` changes, the profit of
    /// every order referencing this product is recomputed with the new cost
    /// inside the same transaction. This retroactive rewrite of historical
    /// order profits is intended behavior.
    #[instrument(skip(self, patch), fields(sku = %sku))]
    pub async fn update_product(
        &self,
        sku: &str,
        patch: ProductPatch,
    ) -> Result<ProductModel, ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await?;

        let model = ProductEntity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(sku.to_string()))?;

        let product_id = model.id;
        let old_cost = model.cost_price;

        let mut active: ProductActiveModel = model.into();

        if let Some(name) = patch.name {
            if name.is_empty() {
                return Err(ServiceError::ValidationError("name must not be empty".into()));
            }
            active.name = Set(name);
        }
        if let Some(cost_price) = patch.cost_price {
            ensure_non_negative("cost_price", cost_price)?;
            active.cost_price = Set(cost_price);
        }
        if let Some(quantity) = patch.quantity {
            if quantity < 0 {
                return Err(ServiceError::ValidationError(
                    "quantity must not be negative".into(),
                ));
            }
            active.quantity = Set(quantity);
        }
        if let Some(preset_price) = patch.preset_price {
            if let Some(preset) = preset_price {
                ensure_non_negative("preset_price", preset)?;
            }
            active.preset_price = Set(preset_price);
        }
        if let Some(actual_price) = patch.actual_price {
            if let Some(actual) = actual_price {
                ensure_non_negative("actual_price", actual)?;
            }
            active.actual_price = Set(actual_price);
        }

        let updated = active.update(&txn).await?;

        if updated.cost_price != old_cost {
            let recomputed =
                recompute_order_profits(&txn, product_id, updated.cost_price).await?;
            info!(
                sku = %updated.sku,
                old_cost = %old_cost,
                new_cost = %updated.cost_price,
                orders_recomputed = recomputed,
                "Cost price changed; order profits recomputed"
            );
        }

        txn.commit().await?;

        info!(sku = %updated.sku, "Product updated");
        Ok(updated)
    }

    /// Deletes a product. A product still referenced by orders cannot be
    /// removed and fails with `ProductInUse`.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, sku: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await?;

        let model = ProductEntity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(sku.to_string()))?;

        let referencing = OrderEntity::find()
            .filter(order::Column::ProductId.eq(model.id))
            .count(&txn)
            .await?;
        if referencing > 0 {
            return Err(ServiceError::ProductInUse(sku.to_string()));
        }

        model.delete(&txn).await?;
        txn.commit().await?;

        info!(sku = %sku, "Product deleted");
        Ok(())
    }

    /// Upserts a batch of products keyed by SKU: insert when absent,
    /// full-field update when present. Rows are independent; each commits
    /// on its own, so a crash mid-batch leaves a well-defined prefix applied.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn upsert_batch(
        &self,
        rows: Vec<CreateProductRequest>,
    ) -> Result<ProductBatchResult, ServiceError> {
        let db = &*self.db_pool;
        let mut inserted = 0;
        let mut updated = 0;

        for row in rows {
            row.validate()?;
            Self::validate_prices(row.cost_price, row.quantity, row.preset_price, row.actual_price)?;

            let existing = ProductEntity::find()
                .filter(product::Column::Sku.eq(row.sku.clone()))
                .one(db)
                .await?;

            match existing {
                Some(model) => {
                    let old_cost = model.cost_price;
                    let product_id = model.id;

                    let txn = db.begin().await?;
                    let mut active: ProductActiveModel = model.into();
                    active.name = Set(row.name);
                    active.cost_price = Set(row.cost_price);
                    active.quantity = Set(row.quantity);
                    active.preset_price = Set(row.preset_price);
                    active.actual_price = Set(row.actual_price);
                    let saved = active.update(&txn).await?;
                    if saved.cost_price != old_cost {
                        recompute_order_profits(&txn, product_id, saved.cost_price).await?;
                    }
                    txn.commit().await?;
                    updated += 1;
                }
                None => {
                    ProductActiveModel {
                        sku: Set(row.sku),
                        name: Set(row.name),
                        cost_price: Set(row.cost_price),
                        quantity: Set(row.quantity),
                        preset_price: Set(row.preset_price),
                        actual_price: Set(row.actual_price),
                        ..Default::default()
                    }
                    .insert(db)
                    .await?;
                    inserted += 1;
                }
            }
        }

        info!(inserted = inserted, updated = updated, "Product batch upsert complete");
        Ok(ProductBatchResult { inserted, updated })
    }
}

/// Rewrites the profit of every order referencing `product_id` using the
/// given cost price. Returns the number of orders touched.
pub(crate) async fn recompute_order_profits<C: sea_orm::ConnectionTrait>(
    conn: &C,
    product_id: i32,
    cost_price: Decimal,
) -> Result<usize, ServiceError> {
    let orders = OrderEntity::find()
        .filter(order::Column::ProductId.eq(product_id))
        .all(conn)
        .await?;

    let count = orders.len();
    for order_model in orders {
        let profit =
            super::orders::compute_profit(order_model.actual_price, cost_price, order_model.quantity);
        let mut active: order::ActiveModel = order_model.into();
        active.profit = Set(profit);
        active.update(conn).await?;
    }
    Ok(count)
}
