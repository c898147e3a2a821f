// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::{AuthError, MIN_PASSWORD_LEN};
use crate::database::DatabaseError;

/// Public, machine-readable error codes. Clients branch on these, so the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Request shape
    InvalidJson,
    InvalidId,
    InvalidServiceId,
    InvalidPagination,
    MissingField,
    InvalidField,
    InvalidEmail,
    InvalidStatus,
    InvalidRating,
    InvalidSlug,

    // Service items
    MissingIcon,
    MissingTitle,
    MissingItems,
    InvalidJsonItems,
    InvalidItemsFormat,
    EmptyItemsArray,
    InvalidDisplayOrder,

    // Lookups
    ServiceNotFound,
    ItemNotFound,
    PostNotFound,
    RecordNotFound,

    // Conflicts
    SlugTaken,
    ServiceHasItems,
    EmailTaken,

    // Auth
    Unauthorized,
    InvalidCredentials,
    SignUpDisabled,
    WeakPassword,
    AuthServiceError,

    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidJson => "INVALID_JSON",
            ErrorCode::InvalidId => "INVALID_ID",
            ErrorCode::InvalidServiceId => "INVALID_SERVICE_ID",
            ErrorCode::InvalidPagination => "INVALID_PAGINATION",
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::InvalidField => "INVALID_FIELD",
            ErrorCode::InvalidEmail => "INVALID_EMAIL",
            ErrorCode::InvalidStatus => "INVALID_STATUS",
            ErrorCode::InvalidRating => "INVALID_RATING",
            ErrorCode::InvalidSlug => "INVALID_SLUG",
            ErrorCode::MissingIcon => "MISSING_ICON",
            ErrorCode::MissingTitle => "MISSING_TITLE",
            ErrorCode::MissingItems => "MISSING_ITEMS",
            ErrorCode::InvalidJsonItems => "INVALID_JSON_ITEMS",
            ErrorCode::InvalidItemsFormat => "INVALID_ITEMS_FORMAT",
            ErrorCode::EmptyItemsArray => "EMPTY_ITEMS_ARRAY",
            ErrorCode::InvalidDisplayOrder => "INVALID_DISPLAY_ORDER",
            ErrorCode::ServiceNotFound => "SERVICE_NOT_FOUND",
            ErrorCode::ItemNotFound => "ITEM_NOT_FOUND",
            ErrorCode::PostNotFound => "POST_NOT_FOUND",
            ErrorCode::RecordNotFound => "RECORD_NOT_FOUND",
            ErrorCode::SlugTaken => "SLUG_TAKEN",
            ErrorCode::ServiceHasItems => "SERVICE_HAS_ITEMS",
            ErrorCode::EmailTaken => "EMAIL_TAKEN",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::SignUpDisabled => "SIGN_UP_DISABLED",
            ErrorCode::WeakPassword => "WEAK_PASSWORD",
            ErrorCode::AuthServiceError => "AUTH_SERVICE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { code: ErrorCode, message: String },

    // 401 Unauthorized
    Unauthorized { code: ErrorCode, message: String },

    // 403 Forbidden
    Forbidden { code: ErrorCode, message: String },

    // 404 Not Found
    NotFound { code: ErrorCode, message: String },

    // 409 Conflict
    Conflict { code: ErrorCode, message: String },

    // 500 Internal Server Error, details stay in the logs
    Internal,

    // 500 from the auth endpoints
    AuthService,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal | ApiError::AuthService => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Conflict { code, .. } => *code,
            ApiError::Internal => ErrorCode::InternalError,
            ApiError::AuthService => ErrorCode::AuthServiceError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. }
            | ApiError::Unauthorized { message, .. }
            | ApiError::Forbidden { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::Conflict { message, .. } => message,
            ApiError::Internal => "An error occurred while processing your request",
            ApiError::AuthService => "Authentication service error",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            // Auth endpoints keep their own minimal failure shape
            ApiError::AuthService => json!({
                "error": self.message(),
                "code": self.error_code().as_str()
            }),
            _ => json!({
                "success": false,
                "error": self.message(),
                "code": self.error_code().as_str()
            }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::BadRequest { code, message: message.into() }
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized { code: ErrorCode::Unauthorized, message: "Authentication required".to_string() }
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized {
            code: ErrorCode::InvalidCredentials,
            message: "Invalid email or password".to_string(),
        }
    }

    pub fn forbidden(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::Forbidden { code, message: message.into() }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::NotFound { code, message: message.into() }
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::Conflict { code, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        // Never forward store text to clients
        match &err {
            DatabaseError::Timeout(limit) => tracing::error!("Record store timed out after {:?}", limit),
            DatabaseError::Cancelled => tracing::warn!("Record store call cancelled by shutdown"),
            other => tracing::error!("Record store error: {}", other),
        }
        ApiError::Internal
    }
}

impl From<crate::filter::FilterError> for ApiError {
    fn from(err: crate::filter::FilterError) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::SignUpDisabled => ApiError::forbidden(ErrorCode::SignUpDisabled, "Sign-up is disabled"),
            AuthError::EmailTaken => {
                ApiError::conflict(ErrorCode::EmailTaken, "An account with this email already exists")
            }
            AuthError::InvalidCredentials => ApiError::invalid_credentials(),
            AuthError::WeakPassword => ApiError::bad_request(
                ErrorCode::WeakPassword,
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ),
            other => {
                tracing::error!("Auth service error: {}", other);
                ApiError::AuthService
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn validation_errors_render_code_and_message() {
        let err = ApiError::bad_request(ErrorCode::MissingIcon, "Icon is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_json(),
            json!({"success": false, "error": "Icon is required", "code": "MISSING_ICON"})
        );
    }

    #[test]
    fn store_failures_do_not_leak_details() {
        let err: ApiError = DatabaseError::QueryError("no such table: secrets".to_string()).into();
        assert_eq!(err, ApiError::Internal);
        let body = err.to_json().to_string();
        assert!(!body.contains("secrets"));
        assert!(body.contains("INTERNAL_ERROR"));

        let err: ApiError = DatabaseError::Timeout(Duration::from_secs(15)).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_map_to_public_codes() {
        assert_eq!(ApiError::from(AuthError::EmailTaken).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(AuthError::SignUpDisabled).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(AuthError::InvalidCredentials).error_code(), ErrorCode::InvalidCredentials);
        assert_eq!(ApiError::from(AuthError::Hash("boom".into())), ApiError::AuthService);
    }

    #[test]
    fn auth_service_error_shape() {
        assert_eq!(
            ApiError::AuthService.to_json(),
            json!({"error": "Authentication service error", "code": "AUTH_SERVICE_ERROR"})
        );
    }
}
