use crate::auth::password::PasswordError;
use crate::config::ConfigError;
use crate::pipeline::PipelineError;
use crate::store::{StoreError, UniqueField};
use crate::telemetry::TelemetryError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Startup and process-level failures. Request failures use [`ApiError`].
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Request(ApiError),
    Storage(StoreError),
    Security(PasswordError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Request(err) => write!(f, "request failed: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Security(err) => write!(f, "security setup error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Request(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Security(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Request(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<PasswordError> for AppError {
    fn from(value: PasswordError) -> Self {
        Self::Security(value)
    }
}

/// Rejection for a candidate `jobId` that is unknown or belongs to another company.
pub(crate) const INVALID_JOB: &str = "Job not found for this company";

/// Tenant-scoped resources whose absence is reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Job,
    Candidate,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Job => f.write_str("Job"),
            ResourceKind::Candidate => f.write_str("Candidate"),
        }
    }
}

/// Request-level failure taxonomy translated to HTTP at the handler boundary.
///
/// Causes are collapsed on purpose: a wrong password and an unknown email share
/// [`ApiError::InvalidCredentials`], and a missing record and another tenant's record
/// share [`ApiError::NotFound`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("No company found")]
    NoCompany,
    #[error("{0} not found")]
    NotFound(ResourceKind),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    Unexpected { context: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(context: impl fmt::Display) -> Self {
        Self::Unexpected {
            context: context.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NoCompany | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Unexpected { context } = &self {
            tracing::error!(error = %context, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(UniqueField::UserEmail) => {
                Self::Conflict("Email already registered".to_string())
            }
            StoreError::Conflict(UniqueField::CandidateEmail) => {
                Self::Conflict("Candidate with this email already exists".to_string())
            }
            StoreError::UnknownJob => Self::validation(INVALID_JOB),
            other => Self::unexpected(other),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(value: PipelineError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::Validation(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::Validation(value.body_text())
    }
}
