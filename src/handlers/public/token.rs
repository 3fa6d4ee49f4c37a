use axum::{extract::State, http::HeaderMap};
use tracing::{info, warn};

use crate::auth::{token, Session, Token};
use crate::error::ApiError;
use crate::middleware::{header_str, ApiResponse, ApiResult, TOKEN_REQUEST_HEADER};
use crate::state::AppState;

/// PUT /api/v0/token - Exchange proof of the api secret for a bearer token
///
/// Headers:
/// - `X-OrgKeep-ID`: caller user id
/// - `X-OrgKeep-TokenRequest`: hex sha256 of (user id + api secret)
///
/// Expected Output:
/// ```json
/// { "success": true, "data": { "bearer": "eyJ...", "expires": 1735689600 } }
/// ```
pub async fn token_put(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> ApiResult<Token> {
    let presented = header_str(&headers, TOKEN_REQUEST_HEADER)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing token request"))?;

    if !token::token_request_matches(&session.user, presented) {
        warn!(user_id = %session.user.id, "Token request did not match");
        return Err(ApiError::unauthorized("Token request does not match"));
    }

    let issued = state.tokens.issue(&session.user)?;
    info!(user_id = %session.user.id, expires = issued.expires, "Issued token");
    Ok(ApiResponse::success(issued))
}
