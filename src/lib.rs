//! shopledger-api
//!
//! Inventory and order-management backend. The product ledger owns product
//! records, the order ledger keeps stock and profit consistent across order
//! mutations, and the reporting engine derives summary, channel, product,
//! and time-series aggregates from a filtered join of the two.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Common response envelope.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let products = Router::new()
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/:sku",
            get(handlers::products::get_product)
                .patch(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        );

    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order)
                .patch(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        );

    let reports = Router::new()
        .route("/reports/summary", get(handlers::reports::summary))
        .route("/reports/channels", get(handlers::reports::channel_stats))
        .route("/reports/products", get(handlers::reports::product_stats))
        .route("/reports/timeseries", get(handlers::reports::time_series));

    let imports = Router::new()
        .route("/imports/products", post(handlers::imports::import_products))
        .route("/imports/orders", post(handlers::imports::import_orders));

    Router::new()
        .merge(products)
        .merge(orders)
        .merge(reports)
        .merge(imports)
}

/// Full application router: health + versioned API + Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
}
