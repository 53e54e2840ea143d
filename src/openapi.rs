use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::order::{Channel, OrderStatus, PaymentMethod};
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services::orders::{CreateOrderRequest, OrderBatchResult, OrderPatch};
use crate::services::products::{CreateProductRequest, ProductBatchResult, ProductPatch};
use crate::services::reports::{ChannelStats, DailyStats, ProductStats, SalesAggregate};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "shopledger API",
        version = "0.1.0",
        description = "Inventory and order-management backend: product ledger, \
order ledger with automatic stock/profit consistency, and sales reporting \
(summary, channel, product, time-series)."
    ),
    paths(
        handlers::reports::summary,
        handlers::reports::channel_stats,
        handlers::reports::product_stats,
        handlers::reports::time_series,
    ),
    components(schemas(
        Channel,
        PaymentMethod,
        OrderStatus,
        CreateProductRequest,
        ProductPatch,
        ProductBatchResult,
        CreateOrderRequest,
        OrderPatch,
        OrderBatchResult,
        SalesAggregate,
        ChannelStats,
        ProductStats,
        DailyStats,
        ErrorResponse,
    ))
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
