// handlers/public/mod.rs - Handlers reachable without a token
//
// Token issuance still needs a resolved session (X-OrgKeep-ID) plus the
// token-request header; everything else here is anonymous.

pub mod token;

pub use token::token_put;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "OrgKeep API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "ok": "/api/v0/ok (public)",
                "token": "/api/v0/token (session + token request)",
                "status": "/api/v0/status (protected)",
                "org": "/api/v0/org[/:id] (protected)",
                "user": "/api/v0/user[/:id] (protected)",
                "self": "/api/v0/self (protected)",
            }
        }
    }))
}

/// GET /health - Store connectivity; 503 when the store is unreachable
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.store.health_check().await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": "ok"
        }
    })))
}

/// GET /api/v0/ok - Liveness probe
pub async fn ok() -> &'static str {
    "OK"
}
