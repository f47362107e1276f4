//! Error types and failure classification.
//!
//! Remote adapters report failures as a [`RemoteError`] carrying a
//! structured [`ErrorCode`]. The classifier maps that code (never the
//! message text) onto an [`ErrorCategory`], and the reconciler turns the
//! category into either a state transition or an [`Error`] for the caller.

use crate::policy::ResourceKind;
use crate::types::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Structured status codes reported by the configuration service.
///
/// These are the Connect protocol codes; their wire form is snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl ErrorCode {
    const ALL: [ErrorCode; 16] = [
        Self::Canceled,
        Self::Unknown,
        Self::InvalidArgument,
        Self::DeadlineExceeded,
        Self::NotFound,
        Self::AlreadyExists,
        Self::PermissionDenied,
        Self::ResourceExhausted,
        Self::FailedPrecondition,
        Self::Aborted,
        Self::OutOfRange,
        Self::Unimplemented,
        Self::Internal,
        Self::Unavailable,
        Self::DataLoss,
        Self::Unauthenticated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
            Self::InvalidArgument => "invalid_argument",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::ResourceExhausted => "resource_exhausted",
            Self::FailedPrecondition => "failed_precondition",
            Self::Aborted => "aborted",
            Self::OutOfRange => "out_of_range",
            Self::Unimplemented => "unimplemented",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
            Self::DataLoss => "data_loss",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// Code implied by an HTTP status when the response body carries none
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::Unimplemented,
            408 => Self::DeadlineExceeded,
            429 | 502 | 503 | 504 => Self::Unavailable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("unknown error code '{s}'"))
    }
}

/// A failure reported by a remote adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// The adapter has no RPC for this call
    pub fn unimplemented(call: &str) -> Self {
        Self::new(
            ErrorCode::Unimplemented,
            format!("{call} is not provided by the remote service"),
        )
    }

    pub fn category(&self) -> ErrorCategory {
        classify(self.code)
    }
}

/// Classification of remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The remote service reports the instance does not exist
    NotFound,
    /// Communication failure; the operation's effect is unknown
    Transient,
    /// Definite failure (validation, permission, internal error)
    Fatal,
}

impl ErrorCategory {
    /// Whether a caller may reasonably retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Resource not found",
            Self::Transient => "Remote service unreachable",
            Self::Fatal => "Remote service rejected the request",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => {
                "The resource no longer exists remotely; refresh to clear it from state"
            }
            Self::Transient => "Check connectivity to the configuration service and try again",
            Self::Fatal => "Check the error details, credentials and the resource definition",
        }
    }
}

/// Map a structured remote code onto exactly one category.
pub fn classify(code: ErrorCode) -> ErrorCategory {
    match code {
        ErrorCode::NotFound => ErrorCategory::NotFound,
        ErrorCode::Unavailable
        | ErrorCode::DeadlineExceeded
        | ErrorCode::ResourceExhausted
        | ErrorCode::Aborted
        | ErrorCode::Canceled => ErrorCategory::Transient,
        _ => ErrorCategory::Fatal,
    }
}

/// Where a failure happened: enough for one actionable diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub kind: ResourceKind,
    pub operation: Operation,
    pub id: Option<String>,
}

impl ErrorContext {
    pub fn new(kind: ResourceKind, operation: Operation, id: Option<&str>) -> Self {
        Self {
            kind,
            operation,
            id: id.map(str::to_string),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operation, self.kind)?;
        if let Some(id) = &self.id {
            write!(f, " '{id}'")?;
        }
        Ok(())
    }
}

/// Caller contract violations, detected before any remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("identifier '{0}' is already set; the instance already exists")]
    IdentifierAlreadySet(String),

    #[error("no identifier in prior state; the instance must be created or imported first")]
    MissingIdentifier,

    #[error("identifier cannot change from '{from}' to '{to}'")]
    IdentifierChanged { from: String, to: String },

    #[error("field '{field}' is immutable and cannot be changed by update")]
    ImmutableFieldChanged { field: String },

    #[error("{0}")]
    Invalid(String),

    #[error("{0} is not supported for this resource kind")]
    Unsupported(Operation),

    #[error("adapter for {adapter} cannot reconcile {kind}")]
    AdapterMismatch {
        kind: ResourceKind,
        adapter: ResourceKind,
    },
}

/// Errors returned by the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller contract violation; nothing was sent to the remote service
    #[error("{context}: precondition failed: {violation}")]
    PreconditionFailed {
        context: ErrorContext,
        violation: Violation,
    },

    /// The instance does not exist remotely and the operation needs it to
    #[error("{context}: resource not found")]
    NotFound { context: ErrorContext },

    /// Effect-unknown communication failure
    #[error("{context}: transient failure: {source}")]
    Transient {
        context: ErrorContext,
        source: RemoteError,
    },

    /// Definite, non-retryable failure
    #[error("{context}: {message}")]
    Fatal {
        context: ErrorContext,
        message: String,
        code: Option<ErrorCode>,
    },
}

impl Error {
    pub fn precondition(context: ErrorContext, violation: Violation) -> Self {
        Self::PreconditionFailed { context, violation }
    }

    /// Build the error for a remote failure that is not absorbed as drift.
    ///
    /// NotFound lands here only when the operation cannot treat absence as
    /// a state transition, so it is reported as fatal.
    pub fn from_remote(context: ErrorContext, err: RemoteError) -> Self {
        match err.category() {
            ErrorCategory::Transient => Self::Transient {
                context,
                source: err,
            },
            ErrorCategory::NotFound | ErrorCategory::Fatal => Self::Fatal {
                context,
                message: err.message,
                code: Some(err.code),
            },
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::PreconditionFailed { context, .. }
            | Self::NotFound { context }
            | Self::Transient { context, .. }
            | Self::Fatal { context, .. } => context,
        }
    }

    /// Whether retrying the same operation might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::PreconditionFailed { violation, .. } => Some(violation),
            _ => None,
        }
    }

    /// Actionable advice for the front-end to print under the diagnostic
    pub fn advice(&self) -> &'static str {
        match self {
            Self::PreconditionFailed { .. } => "Fix the resource definition or state and try again",
            Self::NotFound { .. } => ErrorCategory::NotFound.advice(),
            Self::Transient { .. } => ErrorCategory::Transient.advice(),
            Self::Fatal { .. } => ErrorCategory::Fatal.advice(),
        }
    }
}

/// Result type for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_codes() {
        assert_eq!(classify(ErrorCode::NotFound), ErrorCategory::NotFound);
        assert_eq!(classify(ErrorCode::Unavailable), ErrorCategory::Transient);
        assert_eq!(
            classify(ErrorCode::DeadlineExceeded),
            ErrorCategory::Transient
        );
        assert_eq!(classify(ErrorCode::InvalidArgument), ErrorCategory::Fatal);
        assert_eq!(classify(ErrorCode::PermissionDenied), ErrorCategory::Fatal);
        assert_eq!(classify(ErrorCode::Internal), ErrorCategory::Fatal);
    }

    #[test]
    fn test_classification_ignores_message_text() {
        let err = RemoteError::new(ErrorCode::Internal, "record not found");
        assert_eq!(err.category(), ErrorCategory::Fatal);
    }

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Fatal.is_retryable());
    }

    #[test]
    fn test_code_wire_form() {
        assert_eq!("not_found".parse::<ErrorCode>(), Ok(ErrorCode::NotFound));
        assert_eq!(
            serde_json::to_string(&ErrorCode::DeadlineExceeded).unwrap(),
            "\"deadline_exceeded\""
        );
        assert!("teapot".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_code_from_http_status() {
        assert_eq!(ErrorCode::from_http_status(503), ErrorCode::Unavailable);
        assert_eq!(ErrorCode::from_http_status(401), ErrorCode::Unauthenticated);
        assert_eq!(ErrorCode::from_http_status(500), ErrorCode::Unknown);
    }

    #[test]
    fn test_from_remote_keeps_message_and_context() {
        let context = ErrorContext::new(ResourceKind::DnsRecord, Operation::Update, Some("dns-1"));
        let err = Error::from_remote(
            context.clone(),
            RemoteError::new(ErrorCode::InvalidArgument, "bad values"),
        );
        assert_eq!(
            err.to_string(),
            "update dns_record 'dns-1': bad values"
        );
        assert_eq!(err.context(), &context);
        assert!(!err.is_retryable());

        let err = Error::from_remote(
            context,
            RemoteError::new(ErrorCode::Unavailable, "connection refused"),
        );
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection refused"));
    }
}
