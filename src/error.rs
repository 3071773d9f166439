//! Unified error types for bookstore-server
//!
//! `OrderError` is the taxonomy of the order-placement workflow; every
//! variant aborts (rolls back) the whole order transaction. `ApiError` is
//! the client-facing error: it renders as a `{ "msg": ... }` JSON body and
//! never leaks internal detail.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the order-placement workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Unknown card and no expiration date supplied to register one
    #[error("Unknown credit card; expiration_date is required to register it")]
    PaymentInstrumentNotFound,
    /// Malformed expiration date string
    #[error("Invalid expiration_date; expected YYYY-MM")]
    InvalidPaymentInstrument,
    /// Card expiration month is before the current month
    #[error("Credit card has expired")]
    PaymentInstrumentExpired,
    /// A requested ISBN does not exist
    #[error("Book not found: {0}")]
    BookNotFound(String),
    /// Requested quantity exceeds available stock
    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),
    /// Requested quantity is zero or negative
    #[error("Quantity must be a positive integer for {0}")]
    InvalidQuantity(String),
    /// Database error inside the transaction
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Client-facing API error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("Admin access required")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "msg": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e
            && db.is_unique_violation()
        {
            return ApiError::Conflict("Duplicate entry".into());
        }
        tracing::error!(error = %e, "database error");
        ApiError::Internal
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::Db(db) => db.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// Convenience type alias for JSON handlers
pub type ApiResult<T> = Result<Json<T>, ApiError>;
