use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::entities::order::Model as OrderModel;
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderRequest, OrderPatch};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.create_order(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Vec<OrderModel>> {
    let orders = state.services.orders.list_orders().await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// Resolves an order identifier that may be a numeric id or an order number.
async fn resolve_order(state: &AppState, id: &str) -> Result<OrderModel, ServiceError> {
    if let Ok(order_id) = id.parse::<i32>() {
        return state.services.orders.get_order(order_id).await;
    }
    state.services.orders.get_order_by_number(id).await
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<OrderModel> {
    let order = resolve_order(&state, &id).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<OrderPatch>,
) -> ApiResult<OrderModel> {
    let order = resolve_order(&state, &id).await?;
    let updated = state.services.orders.update_order(order.id, patch).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    let order = resolve_order(&state, &id).await?;
    state.services.orders.delete_order(order.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
