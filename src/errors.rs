use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{error::DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Unprocessable Entity",
    "code": "INSUFFICIENT_QUANTITY",
    "message": "Coupon requires at least 2 items from Pizza",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Unprocessable Entity")]
    pub error: String,
    /// Machine-readable error code
    #[schema(example = "INSUFFICIENT_QUANTITY")]
    pub code: String,
    /// Human-readable error description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Transient storage error: {0}")]
    TransientStorage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    #[error("Coupon expired: {0}")]
    CouponExpired(String),

    #[error("Coupon exhausted: {0}")]
    CouponExhausted(String),

    #[error("{0}")]
    CategoryMismatch(String),

    #[error("{0}")]
    InsufficientQuantity(String),

    #[error("{0}")]
    InsufficientCartAmount(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Maps a raw database error onto the domain taxonomy.
    ///
    /// Connection-level failures become `TransientStorage` (the whole operation
    /// may be retried), foreign key violations become `InvalidReference` and
    /// unique violations become `Conflict`.
    pub fn classify_db(err: DbErr) -> Self {
        if is_transient(&err) {
            return ServiceError::TransientStorage(err.to_string());
        }
        match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                ServiceError::InvalidReference(msg)
            }
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(msg),
            _ => ServiceError::DatabaseError(err),
        }
    }

    /// Whether retrying the entire operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStorage(_))
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::TransientStorage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) | Self::CouponNotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Self::CouponExpired(_) => StatusCode::GONE,
            Self::CouponExhausted(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidReference(_)
            | Self::CategoryMismatch(_)
            | Self::InsufficientQuantity(_)
            | Self::InsufficientCartAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Stable machine-readable code carried in the error body
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::TransientStorage(_) => "TRANSIENT_STORAGE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
            Self::CouponNotFound(_) => "COUPON_NOT_FOUND",
            Self::CouponExpired(_) => "COUPON_EXPIRED",
            Self::CouponExhausted(_) => "COUPON_EXHAUSTED",
            Self::CategoryMismatch(_) => "CATEGORY_MISMATCH",
            Self::InsufficientQuantity(_) => "INSUFFICIENT_QUANTITY",
            Self::InsufficientCartAmount(_) => "INSUFFICIENT_CART_AMOUNT",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InternalError(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            Self::TransientStorage(_) => {
                "Storage temporarily unavailable, please retry".to_string()
            }
            _ => self.to_string(),
        }
    }
}

fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_))
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.error_code().to_string(),
            message: self.response_message(),
            details: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
