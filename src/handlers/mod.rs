pub mod health;
pub mod imports;
pub mod orders;
pub mod products;
pub mod reports;

use crate::db::DbPool;
use crate::services::{orders::OrderService, products::ProductService, reports::ReportService};
use std::sync::Arc;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: ProductService,
    pub orders: OrderService,
    pub reports: ReportService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            products: ProductService::new(db_pool.clone()),
            orders: OrderService::new(db_pool.clone()),
            reports: ReportService::new(db_pool),
        }
    }
}
