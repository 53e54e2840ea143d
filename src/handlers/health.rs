use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sea_orm::{ConnectionTrait, Statement};
use serde_json::json;
use tracing::error;

use crate::AppState;

/// Liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let ping = state
        .db
        .execute(Statement::from_string(
            state.db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await;

    match ping {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            error!(error = %e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unreachable" })),
            )
        }
    }
}
