use crate::{
    db::DbPool,
    entities::money,
    entities::order::{self, Channel, Entity as OrderEntity, Model as OrderModel, OrderStatus, PaymentMethod},
    entities::product::{self, Model as ProductModel},
    errors::ServiceError,
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;

/// Filter predicate over the order ledger. All supplied fields AND together;
/// absent fields impose no constraint. The date range is inclusive on both
/// ends (the end bound covers the whole end day) and applies to the
/// effective date: `transaction_date` falling back to `created_at`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub channels: Option<Vec<Channel>>,
    pub payment_methods: Option<Vec<PaymentMethod>>,
    pub statuses: Option<Vec<OrderStatus>>,
    pub skus: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SalesAggregate {
    pub total_sales: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub total_orders: u64,
    pub total_quantity: i64,
    /// `total_profit / total_sales * 100`, 0 when sales are 0.
    pub profit_margin: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChannelStats {
    pub channel: Channel,
    #[serde(flatten)]
    pub totals: SalesAggregate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductStats {
    pub sku: String,
    pub name: String,
    #[serde(flatten)]
    pub totals: SalesAggregate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyStats {
    /// ISO calendar day of the orders' effective dates.
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: SalesAggregate,
}

/// Running totals in exact decimal arithmetic; rounding happens only when
/// the accumulator is finalized for output.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    sales: Decimal,
    cost: Decimal,
    orders: u64,
    quantity: i64,
}

impl Accumulator {
    fn add(&mut self, order: &OrderModel, prod: &ProductModel) {
        let quantity = Decimal::from(order.quantity);
        self.sales += order.actual_price * quantity;
        self.cost += prod.cost_price * quantity;
        self.orders += 1;
        self.quantity += i64::from(order.quantity);
    }

    fn finalize(self) -> SalesAggregate {
        let profit = self.sales - self.cost;
        let margin = if self.sales.is_zero() {
            Decimal::ZERO
        } else {
            profit / self.sales * Decimal::ONE_HUNDRED
        };
        SalesAggregate {
            total_sales: money::two_dp(self.sales),
            total_cost: money::two_dp(self.cost),
            total_profit: money::two_dp(profit),
            total_orders: self.orders,
            total_quantity: self.quantity,
            profit_margin: money::two_dp(margin),
        }
    }
}

/// Read-only aggregation over a filtered join of the order and product
/// ledgers. Every total is derived from the filtered order set at query
/// time, never from cached ledger state.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Orders joined with their products, all predicates ANDed, ordered by
    /// effective date ascending.
    #[instrument(skip(self, filter))]
    pub async fn filter_orders(
        &self,
        filter: &ReportFilter,
    ) -> Result<Vec<(OrderModel, ProductModel)>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = OrderEntity::find().find_also_related(product::Entity);

        if let Some(channels) = &filter.channels {
            query = query.filter(order::Column::Channel.is_in(channels.clone()));
        }
        if let Some(payment_methods) = &filter.payment_methods {
            query = query.filter(order::Column::PaymentMethod.is_in(payment_methods.clone()));
        }
        if let Some(statuses) = &filter.statuses {
            query = query.filter(order::Column::Status.is_in(statuses.clone()));
        }
        if let Some(skus) = &filter.skus {
            query = query.filter(product::Column::Sku.is_in(skus.clone()));
        }

        let start_bound = filter
            .start_date
            .map(|d| Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()));
        // Inclusive end-of-day: strictly before the next midnight.
        let end_bound = filter
            .end_date
            .and_then(|d| d.succ_opt())
            .map(|d| Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0).unwrap()));

        let mut joined: Vec<(OrderModel, ProductModel)> = query
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(order_model, product_model)| match product_model {
                Some(prod) => Some((order_model, prod)),
                None => {
                    warn!(
                        order_id = order_model.id,
                        product_id = order_model.product_id,
                        "Order references a missing product; excluded from report"
                    );
                    None
                }
            })
            .filter(|(order_model, _)| {
                let effective = order_model.effective_date();
                start_bound.map_or(true, |start| effective >= start)
                    && end_bound.map_or(true, |end| effective < end)
            })
            .collect();

        joined.sort_by_key(|(order_model, _)| order_model.effective_date());
        Ok(joined)
    }

    /// Summary over the filtered set: total sales/cost/profit, order and
    /// unit counts, and the overall profit margin.
    #[instrument(skip(self, filter))]
    pub async fn summary(&self, filter: &ReportFilter) -> Result<SalesAggregate, ServiceError> {
        let rows = self.filter_orders(filter).await?;
        let mut acc = Accumulator::default();
        for (order_model, product_model) in &rows {
            acc.add(order_model, product_model);
        }
        Ok(acc.finalize())
    }

    /// Per-channel aggregates, sorted by descending total sales.
    #[instrument(skip(self, filter))]
    pub async fn channel_stats(&self, filter: &ReportFilter) -> Result<Vec<ChannelStats>, ServiceError> {
        let rows = self.filter_orders(filter).await?;

        let mut groups: HashMap<Channel, Accumulator> = HashMap::new();
        for (order_model, product_model) in &rows {
            groups
                .entry(order_model.channel)
                .or_default()
                .add(order_model, product_model);
        }

        let mut stats: Vec<ChannelStats> = groups
            .into_iter()
            .map(|(channel, acc)| ChannelStats {
                channel,
                totals: acc.finalize(),
            })
            .collect();
        stats.sort_by(|a, b| b.totals.total_sales.cmp(&a.totals.total_sales));
        Ok(stats)
    }

    /// Per-product aggregates keyed by SKU, sorted by descending total sales.
    #[instrument(skip(self, filter))]
    pub async fn product_stats(&self, filter: &ReportFilter) -> Result<Vec<ProductStats>, ServiceError> {
        let rows = self.filter_orders(filter).await?;

        let mut groups: HashMap<String, (String, Accumulator)> = HashMap::new();
        for (order_model, product_model) in &rows {
            let entry = groups
                .entry(product_model.sku.clone())
                .or_insert_with(|| (product_model.name.clone(), Accumulator::default()));
            entry.1.add(order_model, product_model);
        }

        let mut stats: Vec<ProductStats> = groups
            .into_iter()
            .map(|(sku, (name, acc))| ProductStats {
                sku,
                name,
                totals: acc.finalize(),
            })
            .collect();
        stats.sort_by(|a, b| b.totals.total_sales.cmp(&a.totals.total_sales));
        Ok(stats)
    }

    /// Per-calendar-day aggregates over effective dates, ascending.
    #[instrument(skip(self, filter))]
    pub async fn time_series(&self, filter: &ReportFilter) -> Result<Vec<DailyStats>, ServiceError> {
        let rows = self.filter_orders(filter).await?;

        let mut groups: HashMap<NaiveDate, Accumulator> = HashMap::new();
        for (order_model, product_model) in &rows {
            groups
                .entry(order_model.effective_date().date_naive())
                .or_default()
                .add(order_model, product_model);
        }

        let mut stats: Vec<DailyStats> = groups
            .into_iter()
            .map(|(date, acc)| DailyStats {
                date,
                totals: acc.finalize(),
            })
            .collect();
        stats.sort_by_key(|point| point.date);
        Ok(stats)
    }
}
