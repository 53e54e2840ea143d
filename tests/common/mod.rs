use axum::{
    body::Body,
    http::{self, Method, Request, Response},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use shopledger_api::config::AppConfig;
use shopledger_api::entities::product::Model as ProductModel;
use shopledger_api::migrator::Migrator;
use shopledger_api::services::products::CreateProductRequest;
use shopledger_api::AppState;

/// Test fixture over an in-memory SQLite database with the real migrations
/// applied. A single pooled connection keeps the memory database alive and
/// shared across the whole test.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "test".into(),
        log_level: "warn".into(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 60,
        db_acquire_timeout_secs: 5,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .expect("connect to in-memory sqlite");
        Migrator::up(&db, None).await.expect("run migrations");

        let state = AppState::new(Arc::new(db), test_config());
        let router = shopledger_api::router(state.clone());

        Self { state, router }
    }

    /// Creates a product through the product ledger.
    pub async fn seed_product(&self, sku: &str, cost_price: Decimal, quantity: i32) -> ProductModel {
        self.state
            .services
            .products
            .create_product(CreateProductRequest {
                sku: sku.to_string(),
                sku_is_prefix: false,
                name: format!("{sku} product"),
                cost_price,
                quantity,
                preset_price: None,
                actual_price: None,
            })
            .await
            .expect("seed product")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(http::header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    pub async fn request_csv(&self, uri: &str, csv_body: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(http::header::CONTENT_TYPE, "text/csv")
            .body(Body::from(csv_body.to_string()))
            .expect("request");

        self.router.clone().oneshot(request).await.expect("response")
    }
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
