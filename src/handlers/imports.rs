use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::entities::order::{Channel, OrderStatus, PaymentMethod};
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderRequest, OrderBatchResult};
use crate::services::products::{CreateProductRequest, ProductBatchResult};
use crate::{ApiResponse, ApiResult, AppState};

/// CSV columns: sku, name, cost_price, quantity (required);
/// preset_price, actual_price (optional).
#[derive(Debug, Deserialize)]
struct ProductCsvRow {
    sku: String,
    name: String,
    cost_price: Decimal,
    quantity: i32,
    #[serde(default)]
    preset_price: Option<Decimal>,
    #[serde(default)]
    actual_price: Option<Decimal>,
}

/// CSV columns: order_number, product_sku, actual_price, quantity,
/// payment_method, channel, status (required);
/// transaction_date, buyer_name, remark (optional).
#[derive(Debug, Deserialize)]
struct OrderCsvRow {
    order_number: String,
    product_sku: String,
    actual_price: Decimal,
    quantity: i32,
    payment_method: PaymentMethod,
    channel: Channel,
    status: OrderStatus,
    #[serde(default)]
    transaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    buyer_name: Option<String>,
    #[serde(default)]
    remark: Option<String>,
}

/// Parses a CSV body, rejecting malformed rows before anything reaches the
/// ledgers.
fn parse_csv<T: serde::de::DeserializeOwned>(body: &str) -> Result<Vec<T>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<T>().enumerate() {
        // Header is line 1, first data row is line 2.
        let row = record.map_err(|e| {
            ServiceError::ValidationError(format!("CSV row {}: {}", idx + 2, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

pub async fn import_products(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<ProductBatchResult> {
    let rows = parse_csv::<ProductCsvRow>(&body)?
        .into_iter()
        .map(|row| CreateProductRequest {
            sku: row.sku,
            sku_is_prefix: false,
            name: row.name,
            cost_price: row.cost_price,
            quantity: row.quantity,
            preset_price: row.preset_price,
            actual_price: row.actual_price,
        })
        .collect();

    let result = state.services.products.upsert_batch(rows).await?;
    Ok(Json(ApiResponse::success(result)))
}

pub async fn import_orders(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<OrderBatchResult> {
    let rows = parse_csv::<OrderCsvRow>(&body)?
        .into_iter()
        .map(|row| CreateOrderRequest {
            order_number: Some(row.order_number),
            product_sku: row.product_sku,
            actual_price: row.actual_price,
            quantity: row.quantity,
            payment_method: row.payment_method,
            channel: row.channel,
            status: row.status,
            transaction_date: row.transaction_date,
            buyer_name: row.buyer_name,
            remark: row.remark,
        })
        .collect();

    let result = state.services.orders.upsert_batch(rows).await?;
    Ok(Json(ApiResponse::success(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn product_rows_parse_with_optional_columns_absent() {
        let body = "sku,name,cost_price,quantity\nWIDGET,Widget,10.00,5\n";
        let rows: Vec<ProductCsvRow> = parse_csv(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku, "WIDGET");
        assert_eq!(rows[0].cost_price, dec!(10.00));
        assert_eq!(rows[0].preset_price, None);
    }

    #[test]
    fn empty_optional_fields_become_none() {
        let body = "sku,name,cost_price,quantity,preset_price,actual_price\n\
                    WIDGET,Widget,10.00,5,,12.50\n";
        let rows: Vec<ProductCsvRow> = parse_csv(body).unwrap();
        assert_eq!(rows[0].preset_price, None);
        assert_eq!(rows[0].actual_price, Some(dec!(12.50)));
    }

    #[test]
    fn malformed_row_is_rejected_with_line_number() {
        let body = "sku,name,cost_price,quantity\nWIDGET,Widget,not-a-price,5\n";
        let result: Result<Vec<ProductCsvRow>, _> = parse_csv(body);
        assert_matches!(result, Err(ServiceError::ValidationError(msg)) => {
            assert!(msg.contains("row 2"));
        });
    }

    #[test]
    fn order_rows_parse_enum_wire_values() {
        let body = "order_number,product_sku,actual_price,quantity,payment_method,channel,status\n\
                    WIDGET_1,WIDGET,15.00,2,cash,eBay,done\n";
        let rows: Vec<OrderCsvRow> = parse_csv(body).unwrap();
        assert_eq!(rows[0].channel, Channel::Ebay);
        assert_eq!(rows[0].payment_method, PaymentMethod::Cash);
        assert_eq!(rows[0].status, OrderStatus::Done);
    }
}
