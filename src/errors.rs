use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};

/// Error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`; mirrors the success envelope
    pub success: bool,
    /// Human-readable summary of what failed
    pub message: String,
    /// Error description
    pub error: String,
    /// Full error chain, only when diagnostics are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Stages that committed before the failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_stages: Option<Vec<String>>,
    /// RFC 3339 timestamp when the error was produced
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Seeding failed during {stage} after committing [{}]: {source}", .completed.join(", "))]
    PartialSeedFailure {
        stage: String,
        completed: Vec<String>,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

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
    /// Classifies a raw database error into the seeding error kinds.
    ///
    /// Pool exhaustion and acquire timeouts become `ConnectionError`,
    /// unique-key collisions become `ConstraintViolation`, everything else
    /// stays a `DatabaseError`.
    pub fn from_db(err: DbErr) -> Self {
        match &err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                return ServiceError::ConnectionError(err.to_string())
            }
            _ => {}
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::ConstraintViolation(msg),
            _ => ServiceError::DatabaseError(err),
        }
    }

    /// True for DDL failures that only mean the object is already there.
    pub fn is_already_exists(err: &DbErr) -> bool {
        let message = err.to_string().to_ascii_lowercase();

        message.contains("already exists") || message.contains("duplicate column")
    }

    /// Names of the stages that committed before a partial failure.
    pub fn completed_stages(&self) -> Option<&[String]> {
        match self {
            Self::PartialSeedFailure { completed, .. } => Some(completed),
            _ => None,
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ConnectionError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseError(_)
            | Self::SchemaError(_)
            | Self::ConstraintViolation(_)
            | Self::PartialSeedFailure { .. }
            | Self::Cancelled(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the full `source()` chain, one cause per line.
    pub fn diagnostic_chain(&self) -> String {
        let mut out = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            current = std::error::Error::source(cause);
        }
        out
    }

    /// Builds the failure payload, optionally with the diagnostic chain.
    pub fn to_error_response(
        &self,
        message: impl Into<String>,
        expose_details: bool,
    ) -> ErrorResponse {
        ErrorResponse {
            success: false,
            message: message.into(),
            error: self.to_string(),
            details: expose_details.then(|| self.diagnostic_chain()),
            completed_stages: self.completed_stages().map(|s| s.to_vec()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_error_response(
            status.canonical_reason().unwrap_or("Error").to_string(),
            false,
        );
        (status, Json(body)).into_response()
    }
}

pub type AppError = ServiceError;
