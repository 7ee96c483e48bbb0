//! API error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_investment::LedgerError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Error response body, in the same envelope as successful responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::Ledger(err) => (ledger_status(err), err.code()),
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::PropertyNotFound(_)
        | LedgerError::InvestmentNotFound(_)
        | LedgerError::InstallmentNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::PropertyNotInvestable { .. }
        | LedgerError::InsufficientShares { .. }
        | LedgerError::PerUserCapExceeded { .. }
        | LedgerError::AlreadyPaid(_)
        | LedgerError::PaymentsAlreadyMade
        | LedgerError::NotPending { .. }
        | LedgerError::DownPaymentOutstanding
        | LedgerError::ConcurrentModification { .. }
        | LedgerError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
        LedgerError::AmountMismatch { .. } | LedgerError::Validation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LedgerError::Store(port) if port.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Calculation(_) | LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            error!(error = %self, code, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortage_is_conflict() {
        let err = ApiError::from(LedgerError::InsufficientShares {
            requested: 2,
            available: 1,
        });
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "INSUFFICIENT_SHARES"));
    }

    #[test]
    fn test_missing_investment_is_not_found() {
        let err = ApiError::from(LedgerError::InvestmentNotFound(core_kernel::InvestmentId::new()));
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);
    }
}
