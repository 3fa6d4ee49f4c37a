use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::PrivilegeLevel;
use crate::middleware::{ApiResponse, ApiResult, Authenticated};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub started: DateTime<Utc>,
    pub uptime_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user: String,
    pub org: String,
    pub privilege: PrivilegeLevel,
    pub expires: i64,
}

/// GET /api/v0/status - Server uptime
pub async fn status_get(State(state): State<AppState>, _auth: Authenticated) -> ApiResult<StatusResponse> {
    Ok(ApiResponse::success(StatusResponse {
        started: state.started,
        uptime_secs: (Utc::now() - state.started).num_seconds(),
    }))
}

/// GET /api/v0/whoami - Caller identity and privilege level
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": { "user": "uuid", "org": "uuid", "privilege": "org", "expires": 1735689600 }
/// }
/// ```
pub async fn whoami_get(auth: Authenticated) -> ApiResult<WhoamiResponse> {
    Ok(ApiResponse::success(WhoamiResponse {
        user: auth.session.user.id,
        org: auth.session.org.id,
        privilege: auth.session.privilege,
        expires: auth.claims.exp,
    }))
}
