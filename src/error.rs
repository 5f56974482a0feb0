use std::sync::atomic::{ AtomicBool, Ordering };

use thiserror::Error;

/// When false, 500 responses carry a generic message instead of the error text.
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")] Database(#[from] sea_orm::DbErr),

    #[error("Invalid input: {0}")] InvalidInput(String),

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Unsupported network: {0}")] UnsupportedNetwork(String),

    #[error("Invalid contract type: {0}")] InvalidContractType(String),

    #[error("Unauthorized: {0}")] Unauthorized(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Forbidden: {0}")] Forbidden(String),

    #[error("{0} not found")] NotFound(String),

    #[error("Deployment failed: {message}")] Deployment {
        message: String,
        stderr: String,
    },

    #[error("Contract {address} is on chain (tx {tx_hash}) but was not recorded: {reason}")]
    DeploymentNotRecorded {
        address: String,
        tx_hash: String,
        reason: String,
    },

    #[error("Failed to parse deployment result: {0}")] ResultParse(String),

    #[error("RPC error: {0}")] Rpc(String),

    #[error("External service error: {0}")] External(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Internal error: {0}")] Internal(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(rename = "contractAddress", skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            | AppError::InvalidInput(_)
            | AppError::InvalidAddress
            | AppError::UnsupportedNetwork(_)
            | AppError::InvalidContractType(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (code, message, field, stderr) = match self {
            AppError::Database(e) => ("DATABASE_ERROR", e.to_string(), None, None),
            AppError::InvalidInput(msg) => ("INVALID_INPUT", msg.clone(), None, None),
            AppError::InvalidAddress =>
                (
                    "INVALID_ADDRESS",
                    "Invalid address format".to_string(),
                    Some("address".to_string()),
                    None,
                ),
            AppError::UnsupportedNetwork(network) =>
                (
                    "UNSUPPORTED_NETWORK",
                    format!("Unsupported network: {}", network),
                    Some("network".to_string()),
                    None,
                ),
            AppError::InvalidContractType(kind) =>
                (
                    "INVALID_CONTRACT_TYPE",
                    format!("Invalid contract type: {}", kind),
                    Some("contract_type".to_string()),
                    None,
                ),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg.clone(), None, None),
            AppError::InvalidSignature =>
                (
                    "INVALID_SIGNATURE",
                    "Signature does not match address".to_string(),
                    Some("signature".to_string()),
                    None,
                ),
            AppError::Forbidden(msg) => ("FORBIDDEN", msg.clone(), None, None),
            AppError::NotFound(what) => ("NOT_FOUND", format!("{} not found", what), None, None),
            AppError::Deployment { message, stderr } =>
                ("DEPLOYMENT_FAILED", message.clone(), None, Some(stderr.clone())),
            AppError::DeploymentNotRecorded { address, tx_hash, .. } =>
                (
                    "DEPLOYMENT_NOT_RECORDED",
                    format!(
                        "Contract {} was deployed in {} but could not be recorded",
                        address,
                        tx_hash
                    ),
                    None,
                    None,
                ),
            AppError::ResultParse(msg) => ("RESULT_PARSE_FAILED", msg.clone(), None, None),
            AppError::Rpc(msg) => ("RPC_ERROR", msg.clone(), None, None),
            AppError::External(msg) => ("EXTERNAL_ERROR", msg.clone(), None, None),
            AppError::Config(msg) => ("CONFIG_ERROR", msg.clone(), None, None),
            AppError::Internal(msg) => ("INTERNAL_ERROR", msg.clone(), None, None),
        };

        // Toolchain failures are always surfaced verbatim.
        let hide =
            self.status_code().is_server_error() &&
            !matches!(self, AppError::Deployment { .. } | AppError::DeploymentNotRecorded { .. }) &&
            !EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed);
        let message = if hide { "Internal server error".to_string() } else { message };

        ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
                stderr,
                contract_address: match self {
                    AppError::DeploymentNotRecorded { address, .. } => Some(address.clone()),
                    _ => None,
                },
                tx_hash: match self {
                    AppError::DeploymentNotRecorded { tx_hash, .. } => Some(tx_hash.clone()),
                    _ => None,
                },
            },
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let response = self.to_error_response();
        (status, axum::Json(response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
