use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::entities::product::Model as ProductModel;
use crate::errors::ServiceError;
use crate::services::products::{CreateProductRequest, ProductPatch};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Vec<ProductModel>> {
    let products = state.services.products.list_products().await?;
    Ok(Json(ApiResponse::success(products)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> ApiResult<ProductModel> {
    let product = state.services.products.get_product_by_sku(&sku).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> ApiResult<ProductModel> {
    let product = state.services.products.update_product(&sku, patch).await?;
    Ok(Json(ApiResponse::success(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete_product(&sku).await?;
    Ok(StatusCode::NO_CONTENT)
}
