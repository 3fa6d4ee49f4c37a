// HTTP API Error Types
use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::{Forbidden, SessionError, TokenError};
use crate::database::{DatabaseError, ModelError};
use crate::security::CryptError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }

    /// Log the real cause, answer with a generic message
    fn internal(err: &dyn std::error::Error) -> Self {
        tracing::error!(error = %err, "Internal error");
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

// Convert other error types to ApiError
impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Malformed(field) => ApiError::bad_request(format!("Malformed {field}")),
            ModelError::DisallowedValue(field) => {
                ApiError::bad_request(format!("Value not allowed for {field}"))
            }
            ModelError::RelatedUser => {
                ApiError::bad_request("User must be an active member of the org")
            }
            ModelError::RelatedOrg => ApiError::bad_request("Org must exist and be active"),
            ModelError::Conflict => ApiError::conflict("Already exists"),
            ModelError::NotFound => ApiError::not_found("Not found"),
            ModelError::ModelMigrate { .. }
            | ModelError::RowsAffected(_)
            | ModelError::UnknownStatus(_)
            | ModelError::Crypt(_)
            | ModelError::Database(_) => ApiError::internal(&err),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Store(e) => e.into(),
            other => {
                tracing::debug!(error = %other, "Session rejected");
                ApiError::bad_request(other.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Generation(_) => ApiError::internal(&err),
            other => {
                tracing::debug!(error = %other, "Token rejected");
                ApiError::unauthorized("Invalid or expired token")
            }
        }
    }
}

impl From<Forbidden> for ApiError {
    fn from(_: Forbidden) -> Self {
        ApiError::forbidden("Forbidden")
    }
}

impl From<CryptError> for ApiError {
    fn from(err: CryptError) -> Self {
        ApiError::internal(&err)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        tracing::error!(error = %err, "Store unavailable");
        ApiError::service_unavailable("Database temporarily unavailable")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::bad_request(err.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_follow_taxonomy() {
        let cases = [
            (ModelError::Malformed("name"), StatusCode::BAD_REQUEST),
            (ModelError::RelatedUser, StatusCode::BAD_REQUEST),
            (ModelError::RelatedOrg, StatusCode::BAD_REQUEST),
            (ModelError::DisallowedValue("status"), StatusCode::BAD_REQUEST),
            (ModelError::Conflict, StatusCode::CONFLICT),
            (ModelError::NotFound, StatusCode::NOT_FOUND),
            (ModelError::RowsAffected(2), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ModelError::ModelMigrate { found: 3, expected: 0 },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ModelError::Crypt(CryptError::Decrypt), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError::from(ModelError::ModelMigrate { found: 3, expected: 0 });
        assert!(!err.message().contains('3'));
    }

    #[test]
    fn auth_errors() {
        assert_eq!(
            ApiError::from(SessionError::UserInactive).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SessionError::Store(ModelError::Database(sqlx::Error::PoolTimedOut)))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::from(TokenError::Expired).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(TokenError::Generation("x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::from(Forbidden).status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_outage_is_unavailable() {
        let err = ApiError::from(DatabaseError::Sqlx(sqlx::Error::PoolClosed));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn json_envelope() {
        let body = ApiError::conflict("Already exists").to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["error"], "Already exists");
    }
}
