//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter maps each
//! [`ErrorType`] to a status code through a closed table and renders the
//! payload; nothing in the domain knows about HTTP.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::TraceId;

/// Closed set of failure categories carried by every [`DomainError`].
///
/// The wire form is the human-readable label (for example `"Data not found"`).
/// Labels that do not match a known category parse to [`ErrorType::Unknown`],
/// so collaborators emitting new labels degrade to an internal error instead
/// of failing deserialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", from = "String")]
pub enum ErrorType {
    /// The request payload is malformed or fails validation.
    InvalidInput,
    /// The operation would violate a domain invariant, such as removing the
    /// last administrator of a space.
    UndesirableOperation,
    /// The target is not in a state that allows the operation.
    InvalidState,
    /// A payload or collection exceeded a configured limit.
    MaximumSizeExceeded,
    /// No valid session or user where one is required.
    AuthenticationRequired,
    /// The principal is known but lacks permission.
    AccessDenied,
    /// The referenced entity does not exist.
    DataNotFound,
    /// A downstream collaborator failed.
    ExternalService,
    /// Anything unclassified.
    Unknown,
}

impl ErrorType {
    /// Every declared category, in table order.
    pub const ALL: [Self; 9] = [
        Self::InvalidInput,
        Self::UndesirableOperation,
        Self::InvalidState,
        Self::MaximumSizeExceeded,
        Self::AuthenticationRequired,
        Self::AccessDenied,
        Self::DataNotFound,
        Self::ExternalService,
        Self::Unknown,
    ];

    /// Stable wire label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::UndesirableOperation => "Undesirable operation",
            Self::InvalidState => "Invalid state",
            Self::MaximumSizeExceeded => "Maximum size exceeded",
            Self::AuthenticationRequired => "Authentication required",
            Self::AccessDenied => "Access denied",
            Self::DataNotFound => "Data not found",
            Self::ExternalService => "External service",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse a wire label; unrecognised labels map to [`ErrorType::Unknown`].
    ///
    /// # Examples
    /// ```
    /// use session_gate::domain::ErrorType;
    ///
    /// assert_eq!(ErrorType::from_label("Data not found"), ErrorType::DataNotFound);
    /// assert_eq!(ErrorType::from_label("Cosmic rays"), ErrorType::Unknown);
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == label)
            .unwrap_or(Self::Unknown)
    }

    /// Severity used when the failure site does not choose one.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::ExternalService | Self::Unknown => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<ErrorType> for &'static str {
    fn from(value: ErrorType) -> Self {
        value.label()
    }
}

impl From<String> for ErrorType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

/// Observability routing hint. Never influences the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected client-side failure; logged without alerting.
    Warning,
    /// Server-side failure worth an error log.
    Error,
    /// Failure that should page someone.
    Fatal,
}

/// Validation errors emitted by the [`DomainError`] constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainErrorValidationError {
    /// The message was empty once trimmed.
    EmptyMessage,
}

impl fmt::Display for DomainErrorValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "error message must not be empty"),
        }
    }
}

impl std::error::Error for DomainErrorValidationError {}

/// Structured failure value constructed at the failure site and propagated
/// unmodified to the error normaliser.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use session_gate::domain::{DomainError, ErrorType, Severity};
///
/// let err = DomainError::not_found("Space not found");
/// assert_eq!(err.error_type(), ErrorType::DataNotFound);
/// assert_eq!(err.severity(), Severity::Warning);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DomainError {
    error_type: ErrorType,
    message: String,
    severity: Severity,
    details: Option<Value>,
    trace_id: Option<String>,
}

impl DomainError {
    /// Create a new error, panicking if validation fails.
    ///
    /// Captures the current trace identifier if one is in scope.
    ///
    /// # Panics
    /// Panics when `message` is blank; use [`DomainError::try_new`] for
    /// caller-supplied text.
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        match Self::try_new(error_type, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(
        error_type: ErrorType,
        message: impl Into<String>,
    ) -> Result<Self, DomainErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(DomainErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            error_type,
            message,
            severity: error_type.default_severity(),
            details: None,
            trace_id: TraceId::current().map(|id| id.to_string()),
        })
    }

    /// Failure category.
    #[must_use]
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Observability severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Supplementary error details for adapters.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Correlation identifier captured at construction, if any.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Override the default severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use session_gate::domain::DomainError;
    /// use serde_json::json;
    ///
    /// let err = DomainError::invalid_input("bad")
    ///     .with_details(json!({ "field": "name" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a trace identifier explicitly.
    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Convenience constructor for [`ErrorType::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorType::InvalidInput, message)
    }

    /// Convenience constructor for [`ErrorType::UndesirableOperation`].
    pub fn undesirable_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorType::UndesirableOperation, message)
    }

    /// Convenience constructor for [`ErrorType::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorType::InvalidState, message)
    }

    /// Convenience constructor for [`ErrorType::AuthenticationRequired`].
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorType::AuthenticationRequired, message)
    }

    /// Convenience constructor for [`ErrorType::AccessDenied`].
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorType::AccessDenied, message)
    }

    /// Convenience constructor for [`ErrorType::DataNotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorType::DataNotFound, message)
    }

    /// Convenience constructor for [`ErrorType::ExternalService`].
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorType::ExternalService, message)
    }

    /// Convenience constructor for [`ErrorType::Unknown`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Unknown, message)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for DomainError {}
