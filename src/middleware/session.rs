use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::auth::{self, token, Claims, Session};
use crate::error::ApiError;
use crate::state::AppState;

pub const ID_HEADER: &str = "x-orgkeep-id";
pub const TOKEN_REQUEST_HEADER: &str = "x-orgkeep-tokenrequest";

/// Header value as a string; absent or non-ASCII values count as missing
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolves the caller named by `X-OrgKeep-ID`. No token needed; used by
/// token issuance.
#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = header_str(&parts.headers, ID_HEADER);
        Ok(auth::resolve(&state.store, &state.codec, &state.root, caller).await?)
    }
}

/// A session whose bearer token verified and still matches the caller's
/// current org and email.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: Session,
    pub claims: Claims,
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let bearer = header_str(&parts.headers, axum::http::header::AUTHORIZATION.as_str())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Missing authorization token"))?;

        let claims = state.tokens.verify(&session.user.id, bearer)?;
        token::check_binding(&claims, &session.user)?;

        Ok(Self { session, claims })
    }
}
