//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep [`DomainError`] HTTP-agnostic while giving every failure a
//! single status code, a consistent JSON body, and a log line routed by
//! severity. The mapping from [`ErrorType`] is an exhaustive `match`, so a new
//! category cannot be added without choosing its status.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::{DomainError, ErrorType, Severity, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, DomainError>;

/// Client-facing message for redacted failures.
pub const REDACTED_MESSAGE: &str = "Something went wrong";

/// JSON error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Human-readable message.
    #[schema(example = "Please log in")]
    pub error: String,
    /// Failure category label.
    #[schema(value_type = String, example = "Authentication required")]
    pub error_type: ErrorType,
    /// Observability severity.
    pub severity: Severity,
    /// Correlation identifier for support requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub trace_id: Option<String>,
    /// Supplementary details, such as the failing field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<Value>,
}

/// HTTP status for an error category.
#[must_use]
pub fn status_for(error_type: ErrorType) -> StatusCode {
    match error_type {
        ErrorType::InvalidInput | ErrorType::UndesirableOperation => StatusCode::BAD_REQUEST,
        ErrorType::InvalidState => StatusCode::CONFLICT,
        ErrorType::MaximumSizeExceeded => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorType::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        ErrorType::AccessDenied => StatusCode::FORBIDDEN,
        ErrorType::DataNotFound => StatusCode::NOT_FOUND,
        ErrorType::ExternalService => StatusCode::BAD_GATEWAY,
        ErrorType::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status for a raw category label; unmapped labels yield 500.
///
/// # Examples
/// ```
/// use actix_web::http::StatusCode;
/// use session_gate::inbound::http::error::status_for_label;
///
/// assert_eq!(status_for_label("Access denied"), StatusCode::FORBIDDEN);
/// assert_eq!(status_for_label("Quota exhausted"), StatusCode::INTERNAL_SERVER_ERROR);
/// ```
#[must_use]
pub fn status_for_label(label: &str) -> StatusCode {
    status_for(ErrorType::from_label(label))
}

/// Produce the status and body for `err`.
///
/// `Unknown` errors are redacted: the message becomes
/// [`REDACTED_MESSAGE`] and details are dropped.
#[must_use]
pub fn normalize(err: &DomainError) -> (StatusCode, ErrorBody) {
    let redact = err.error_type() == ErrorType::Unknown;
    let body = ErrorBody {
        error: if redact {
            REDACTED_MESSAGE.to_owned()
        } else {
            err.message().to_owned()
        },
        error_type: err.error_type(),
        severity: err.severity(),
        trace_id: err.trace_id().map(str::to_owned),
        details: if redact { None } else { err.details().cloned() },
    };
    (status_for(err.error_type()), body)
}

/// Emit the log line for `err` at the level its severity calls for.
pub fn log_error(err: &DomainError, status: StatusCode) {
    let trace_id = err.trace_id().unwrap_or_default();
    let error_type = err.error_type().label();
    match err.severity() {
        Severity::Warning => info!(
            status = status.as_u16(),
            error_type,
            trace_id,
            detail = err.message(),
            "request failed"
        ),
        Severity::Error => error!(
            status = status.as_u16(),
            error_type,
            trace_id,
            detail = err.message(),
            "request failed"
        ),
        Severity::Fatal => error!(
            status = status.as_u16(),
            error_type,
            trace_id,
            detail = err.message(),
            alert = true,
            "request failed"
        ),
    }
}

/// Log `err` and render it as a response.
#[must_use]
pub fn error_response(err: &DomainError) -> HttpResponse {
    let (status, body) = normalize(err);
    log_error(err, status);
    let mut builder = HttpResponse::build(status);
    if let Some(id) = err.trace_id() {
        builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
    }
    builder.json(body)
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        status_for(self.error_type())
    }

    fn error_response(&self) -> HttpResponse {
        error_response(self)
    }
}

impl From<actix_web::Error> for DomainError {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        DomainError::internal("Internal server error")
    }
}

#[cfg(test)]
mod tests;
