//! # Client Error Types
//!
//! Unified error handling for the sign-transfer library and CLI operations.

use thiserror::Error;

use crate::transfer::TransferStep;

/// Client operation result type
pub type ClientResult<T> = Result<T, ClientError>;

/// Comprehensive error types for client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a status other than the one the operation expects.
    #[error("Bad response: HTTP {status} - {body}")]
    BadResponse { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    #[error("Cloning template {template_id} failed while trying to {step}: {source}")]
    CloneFailed {
        template_id: String,
        step: TransferStep,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Create a bad response error from an HTTP status and raw body
    pub fn bad_response(status: u16, body: impl Into<String>) -> Self {
        Self::BadResponse {
            status,
            body: body.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an invalid response error for 2xx bodies missing required data
    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Wrap an error with the template and step that produced it
    pub fn clone_failed(template_id: impl Into<String>, step: TransferStep, source: Self) -> Self {
        Self::CloneFailed {
            template_id: template_id.into(),
            step,
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `CloneFailed` wrappers
    #[must_use]
    pub fn root_cause(&self) -> &ClientError {
        match self {
            ClientError::CloneFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_bad_response(&self) -> bool {
        matches!(self.root_cause(), ClientError::BadResponse { .. })
    }

    /// HTTP status carried by a `BadResponse`, if that is what failed
    #[must_use]
    pub fn bad_response_status(&self) -> Option<u16> {
        match self.root_cause() {
            ClientError::BadResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), ClientError::Cancelled { .. })
    }

    /// Process exit code for this error
    ///
    /// | code | meaning                         |
    /// |------|---------------------------------|
    /// | 1    | generic failure                 |
    /// | 2    | configuration or invalid input  |
    /// | 3    | unexpected API response status  |
    /// | 4    | transport failure               |
    /// | 5    | cancelled                       |
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self.root_cause() {
            ClientError::ConfigError(_) | ClientError::InvalidInput(_) => 2,
            ClientError::BadResponse { .. } => 3,
            ClientError::HttpError(_) => 4,
            ClientError::Cancelled { .. } => 5,
            _ => 1,
        }
    }
}
