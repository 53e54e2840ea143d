use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Product with SKU {0} not found")]
    ProductNotFound(String),

    #[error("Order {0} not found")]
    OrderNotFound(String),

    #[error("Product with SKU {0} already exists")]
    DuplicateSku(String),

    #[error("Order number {0} already exists")]
    DuplicateOrderNumber(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Product {0} still has orders referencing it")]
    ProductInUse(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ProductNotFound(_) | Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateSku(_) | Self::DuplicateOrderNumber(_) | Self::ProductInUse(_) => {
                StatusCode::CONFLICT
            }
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message suitable for HTTP responses. Internal errors return a generic
    /// message to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_distinguish_error_kinds() {
        assert_eq!(
            ServiceError::ProductNotFound("X".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::DuplicateSku("X".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InsufficientStock("X".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::ValidationError("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let err = ServiceError::DatabaseError(sea_orm::error::DbErr::Custom(
            "connection string with secrets".into(),
        ));
        assert_eq!(err.response_message(), "Database error");
    }
}
