use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::gateway::GatewayError;

/// Failure taxonomy for the trading pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Network / rate-limit failure that outlived the gateway's own retries.
    /// The step is abandoned and retried on the next pass.
    #[error("transient gateway error: {0}")]
    Transient(String),

    /// Unparsable numeric field, missing data or similar.
    #[error("validation error: {0}")]
    Validation(String),

    /// Approval/swap submission failure, receipt timeout or on-chain revert.
    /// Terminal for the trade being executed.
    #[error("execution error: {0}")]
    Execution(String),

    /// Operator configuration problem (no enabled wallets, unknown chain).
    /// Aborts the whole pass.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::Transient(_))
    }
}

impl From<GatewayError> for PipelineError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Transient(msg) => PipelineError::Transient(msg),
            GatewayError::InvalidResponse(msg) => PipelineError::Validation(msg),
            GatewayError::Unsupported(msg) => PipelineError::Configuration(msg),
            e @ (GatewayError::Rejected(_) | GatewayError::ReceiptTimeout { .. }) => {
                PipelineError::Execution(e.to_string())
            }
        }
    }
}

/// Errors surfaced by the reporting API.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}
