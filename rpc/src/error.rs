//! RPC error types and their HTTP mapping.
//!
//! Every error leaves the server as `{"error": {"code", "message"}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use vetting_store::StoreError;
use vetting_verification::{IntakeError, ReviewError, StateError, VerificationError};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("missing or invalid caller identity: {0}")]
    Unauthenticated(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("metrics are disabled")]
    MetricsDisabled,

    #[error("server error: {0}")]
    Server(String),
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        RpcError::Verification(VerificationError::Store(e))
    }
}

impl RpcError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RpcError::Verification(e) => match e {
                VerificationError::Intake(IntakeError::OutstandingRequestExists { .. }) => {
                    StatusCode::CONFLICT
                }
                VerificationError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
                VerificationError::State(StateError::AlreadyFinalized { .. }) => {
                    StatusCode::CONFLICT
                }
                VerificationError::Review(ReviewError::Unauthorized(_)) => StatusCode::FORBIDDEN,
                VerificationError::Review(ReviewError::NotFound(_)) => StatusCode::NOT_FOUND,
                VerificationError::Review(ReviewError::ReasonRequired) => StatusCode::BAD_REQUEST,
                VerificationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RpcError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::MetricsDisabled => StatusCode::NOT_FOUND,
            RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RpcError::Verification(e) => e.code(),
            RpcError::Unauthenticated(_) => "unauthenticated",
            RpcError::InvalidRequest(_) => "invalid_request",
            RpcError::MetricsDisabled => "not_found",
            RpcError::Server(_) => "internal_error",
        }
    }

    /// Client-facing message. Infrastructure details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            RpcError::Verification(VerificationError::Store(_)) | RpcError::Server(_) => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}
