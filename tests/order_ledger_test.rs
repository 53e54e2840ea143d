//! Integration tests for the order ledger: stock reservation on create,
//! quantity-delta handling on update, restock on delete, and the batch
//! upsert row-error semantics.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use shopledger_api::entities::order::{Channel, OrderStatus, PaymentMethod};
use shopledger_api::errors::ServiceError;
use shopledger_api::services::orders::{CreateOrderRequest, OrderPatch};

fn order_request(sku: &str, price: Decimal, quantity: i32) -> CreateOrderRequest {
    CreateOrderRequest {
        order_number: None,
        product_sku: sku.to_string(),
        actual_price: price,
        quantity,
        payment_method: PaymentMethod::Cash,
        channel: Channel::Ebay,
        status: OrderStatus::Pending,
        transaction_date: None,
        buyer_name: None,
        remark: None,
    }
}

async fn stock_of(app: &TestApp, sku: &str) -> i32 {
    app.state
        .services
        .products
        .get_product_by_sku(sku)
        .await
        .expect("product")
        .quantity
}

#[tokio::test]
async fn create_decrements_stock_and_derives_profit() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let order = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 2))
        .await
        .expect("create order");

    assert_eq!(order.profit, dec!(10.00));
    assert_eq!(stock_of(&app, "WIDGET").await, 3);

    // The product mirrors the last sale price.
    let product = app
        .state
        .services
        .products
        .get_product_by_sku("WIDGET")
        .await
        .expect("product");
    assert_eq!(product.actual_price, Some(dec!(15.00)));
}

#[tokio::test]
async fn insufficient_stock_fails_and_leaves_stock_unchanged() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    app.state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 2))
        .await
        .expect("first order");

    let result = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 10))
        .await;

    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
    assert_eq!(stock_of(&app, "WIDGET").await, 3);
}

#[tokio::test]
async fn unknown_product_fails_with_product_not_found() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .orders
        .create_order(order_request("GHOST", dec!(15.00), 1))
        .await;

    assert_matches!(result, Err(ServiceError::ProductNotFound(sku)) => {
        assert_eq!(sku, "GHOST");
    });
}

#[tokio::test]
async fn order_numbers_derive_from_the_products_existing_orders() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 10).await;

    let first = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 1))
        .await
        .expect("first");
    let second = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 1))
        .await
        .expect("second");

    assert_eq!(first.order_number, "WIDGET_1");
    assert_eq!(second.order_number, "WIDGET_2");
}

#[tokio::test]
async fn explicit_duplicate_order_number_is_rejected() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 10).await;

    let mut request = order_request("WIDGET", dec!(15.00), 1);
    request.order_number = Some("ORD-1".to_string());
    app.state
        .services
        .orders
        .create_order(request.clone())
        .await
        .expect("first");

    let result = app.state.services.orders.create_order(request).await;
    assert_matches!(result, Err(ServiceError::DuplicateOrderNumber(n)) => {
        assert_eq!(n, "ORD-1");
    });
    // The failed create must not have touched stock.
    assert_eq!(stock_of(&app, "WIDGET").await, 9);
}

#[tokio::test]
async fn quantity_increase_draws_down_stock_and_recomputes_profit() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let order = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 2))
        .await
        .expect("create");

    let patch: OrderPatch = serde_json::from_str(r#"{"quantity": 4}"#).unwrap();
    let updated = app
        .state
        .services
        .orders
        .update_order(order.id, patch)
        .await
        .expect("update");

    assert_eq!(updated.quantity, 4);
    assert_eq!(updated.profit, dec!(20.00));
    assert_eq!(stock_of(&app, "WIDGET").await, 1);
}

#[tokio::test]
async fn quantity_decrease_returns_stock() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let order = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 4))
        .await
        .expect("create");
    assert_eq!(stock_of(&app, "WIDGET").await, 1);

    let patch: OrderPatch = serde_json::from_str(r#"{"quantity": 1}"#).unwrap();
    let updated = app
        .state
        .services
        .orders
        .update_order(order.id, patch)
        .await
        .expect("update");

    assert_eq!(updated.profit, dec!(5.00));
    assert_eq!(stock_of(&app, "WIDGET").await, 4);
}

#[tokio::test]
async fn quantity_increase_beyond_stock_fails_without_side_effects() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let order = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 2))
        .await
        .expect("create");

    let patch: OrderPatch = serde_json::from_str(r#"{"quantity": 6}"#).unwrap();
    let result = app.state.services.orders.update_order(order.id, patch).await;

    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
    assert_eq!(stock_of(&app, "WIDGET").await, 3);

    let reloaded = app
        .state
        .services
        .orders
        .get_order(order.id)
        .await
        .expect("reload");
    assert_eq!(reloaded.quantity, 2);
}

#[tokio::test]
async fn price_update_recomputes_profit_from_the_formula() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let order = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 2))
        .await
        .expect("create");

    let patch: OrderPatch = serde_json::from_str(r#"{"actual_price": "18.00"}"#).unwrap();
    let updated = app
        .state
        .services
        .orders
        .update_order(order.id, patch)
        .await
        .expect("update");

    assert_eq!(updated.profit, dec!(16.00));
}

#[tokio::test]
async fn caller_supplied_profit_is_ignored_on_update() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let order = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 2))
        .await
        .expect("create");

    // `profit` is not a recognized patch field; it deserializes away and the
    // stored profit stays formula-derived.
    let patch: OrderPatch = serde_json::from_str(r#"{"profit": "999.00"}"#).unwrap();
    let updated = app
        .state
        .services
        .orders
        .update_order(order.id, patch)
        .await
        .expect("update");

    assert_eq!(updated.profit, dec!(10.00));
}

#[tokio::test]
async fn delete_restores_exactly_the_deleted_quantity() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let order = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 3))
        .await
        .expect("create");
    assert_eq!(stock_of(&app, "WIDGET").await, 2);

    app.state
        .services
        .orders
        .delete_order(order.id)
        .await
        .expect("delete");

    assert_eq!(stock_of(&app, "WIDGET").await, 5);
    let result = app.state.services.orders.get_order(order.id).await;
    assert_matches!(result, Err(ServiceError::OrderNotFound(_)));
}

#[tokio::test]
async fn batch_upsert_skips_existing_and_collects_row_errors() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let mut existing = order_request("WIDGET", dec!(15.00), 1);
    existing.order_number = Some("ORD-1".to_string());
    app.state
        .services
        .orders
        .create_order(existing.clone())
        .await
        .expect("existing order");

    let mut too_many = order_request("WIDGET", dec!(15.00), 100);
    too_many.order_number = Some("ORD-2".to_string());
    let mut unknown = order_request("GHOST", dec!(15.00), 1);
    unknown.order_number = Some("ORD-3".to_string());
    let mut fresh = order_request("WIDGET", dec!(15.00), 2);
    fresh.order_number = Some("ORD-4".to_string());

    let result = app
        .state
        .services
        .orders
        .upsert_batch(vec![existing, too_many, unknown, fresh])
        .await
        .expect("batch");

    assert_eq!(result.inserted, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.total_processed, 4);
    assert!(result.errors.iter().any(|e| e.starts_with("ORD-2:")));
    assert!(result.errors.iter().any(|e| e.starts_with("ORD-3:")));

    // Only the successful row touched stock: 5 - 1 (existing) - 2 (fresh).
    assert_eq!(stock_of(&app, "WIDGET").await, 2);
}

#[tokio::test]
async fn get_by_number_finds_orders() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let created = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 1))
        .await
        .expect("create");

    let fetched = app
        .state
        .services
        .orders
        .get_order_by_number(&created.order_number)
        .await
        .expect("get by number");
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
async fn zero_quantity_orders_are_rejected() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    let result = app
        .state
        .services
        .orders
        .create_order(order_request("WIDGET", dec!(15.00), 0))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn concurrent_creates_never_oversell() {
    let app = TestApp::new().await;
    app.seed_product("WIDGET", dec!(10.00), 5).await;

    // Both transactions read the product row under an exclusive lock, so the
    // second sees the first's decrement rather than the original quantity.
    let orders = &app.state.services.orders;
    let (a, b) = tokio::join!(
        orders.create_order(order_request("WIDGET", dec!(15.00), 3)),
        orders.create_order(order_request("WIDGET", dec!(15.00), 3)),
    );

    let results = [a, b];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let failed = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::InsufficientStock(_))))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(failed, 1);
    assert_eq!(stock_of(&app, "WIDGET").await, 2);
}
