//! # Error Types
//!
//! Structured error types for cost_core. These errors are designed to be
//! informative for both humans and programs, carrying enough context to
//! show the user which entity is at fault.
//!
//! Definition problems (bad keys, missing quantities...) are not reported one
//! at a time: the validator collects all of them into a
//! [`ValidationReport`], and [`CalcError::ValidationFailed`] carries that
//! report whole.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::errors::CalcError;
//! use cost_core::project::AllocationSettings;
//! use cost_core::{calculate, samples};
//!
//! let mut def = samples::tutorial();
//! def.centers.retain(|c| c.name != "Section A");
//!
//! match calculate(&def, &AllocationSettings::default()) {
//!     Err(CalcError::ValidationFailed { report }) => assert!(report.error_count() > 0),
//!     other => panic!("expected a validation failure, got {other:?}"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationReport;

/// Result type alias for cost_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for allocation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// The project definition did not pass validation; nothing was computed
    #[error("Project definition is invalid: {} error(s)", .report.error_count())]
    ValidationFailed { report: ValidationReport },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// A pipeline stage received data that validation should have rejected
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        CalcError::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// The validation report, when this error came from validation
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            CalcError::ValidationFailed { report } => Some(report),
            _ => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::ValidationFailed { .. } => "VALIDATION_FAILED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{EntityRef, IssueKind, ValidationIssue};

    #[test]
    fn test_error_serialization() {
        let error = CalcError::file_locked("atelier.sct", "bob@host", "2025-01-01T00:00:00Z");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"FileLocked\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::file_error("read", "a.sct", "denied").error_code(), "FILE_ERROR");
        assert_eq!(CalcError::internal("oops").error_code(), "INTERNAL_ERROR");
        assert!(CalcError::file_locked("a.sct", "bob", "now").is_recoverable());
        assert!(!CalcError::internal("oops").is_recoverable());
    }

    #[test]
    fn test_validation_failed_message_counts_errors() {
        let mut report = ValidationReport::default();
        report.push(ValidationIssue::error(EntityRef::Project, IssueKind::NoPrimaryCenter));
        let error = CalcError::ValidationFailed { report };
        assert_eq!(error.to_string(), "Project definition is invalid: 1 error(s)");
        assert_eq!(error.validation_report().map(|r| r.issues.len()), Some(1));
    }
}
