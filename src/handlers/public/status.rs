use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Travel API (Rust)",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/auth/register, /api/auth/login (public), /api/auth/me (token)",
                "trips": "/api/trips[?query=&page=&size=], /api/trips/:id (public reads)",
                "mine": "/api/trips/mine (token)",
                "write": "POST /api/trips, PUT|DELETE /api/trips/:id (token, owner)",
                "upload": "POST /api/trips/upload, PUT /api/trips/:id/upload (multipart, token)",
                "health": "/health"
            }
        }
    }))
}

/// GET /health - liveness plus a database ping when Postgres is in use
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = match &state.database {
        None => "memory",
        Some(database) => {
            database.health_check().await.map_err(|e| {
                tracing::error!("Health check failed: {}", e);
                ApiError::service_unavailable("Database unavailable")
            })?;
            "ok"
        }
    };

    Ok(Json(json!({
        "success": true,
        "data": { "status": "ok", "timestamp": chrono::Utc::now(), "database": database }
    })))
}
