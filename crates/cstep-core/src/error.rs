//! Error types and error code constants for cstep.
//!
//! This module provides a unified error type (`CstepError`) that bridges
//! domain-specific errors from the engine layers (frontend, CST, instrumentation)
//! into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller, bad configuration)
//! - `3`: Resolution errors (file not found, C source the frontend rejects)
//! - `4`: Build failures (CST round-trip mismatch, incomplete batch)
//! - `5`: Metadata preconditions (missing type, scope, or token)
//! - `10`: Internal errors (contract violations, I/O, unexpected state)
//!
//! The bridges from layer errors live in the root crate, next to the CLI,
//! since this crate sits below every layer.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed configuration).
    InvalidArguments = 2,
    /// Resolution errors (file not found, unparseable source).
    ResolutionError = 3,
    /// The CST could not be built faithfully, or a batch did not complete.
    BuildFailed = 4,
    /// A node lacked information an instrumentation rule requires.
    PreconditionFailed = 5,
    /// Internal errors (bugs, contract violations, I/O).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum CstepError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Configuration file could not be read or parsed.
    #[error("configuration error in {path}: {message}")]
    Config { path: String, message: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// The C frontend rejected the input.
    #[error("parse error at {file}:{line}:{col}: {message}")]
    ParseFailed {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// The CST could not reproduce the source it was built from.
    #[error("round-trip failed: {message}")]
    RoundTripFailed {
        message: String,
        file: Option<String>,
    },

    /// An instrumentation rule needed information the parse tree lacks.
    #[error("missing metadata: {message}")]
    MetadataPrecondition {
        message: String,
        node_kind: Option<String>,
    },

    /// A modification forest broke the applier's contract (engine bug).
    #[error("contract violation: {message}")]
    ContractViolation { message: String },

    /// Some files of a batch failed; the others were written.
    #[error("{failed} of {total} files failed")]
    BatchFailed {
        failed: usize,
        total: usize,
        details: serde_json::Value,
    },

    /// Internal error (bug, I/O failure or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&CstepError> for OutputErrorCode {
    fn from(err: &CstepError) -> Self {
        match err {
            CstepError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            CstepError::Config { .. } => OutputErrorCode::InvalidArguments,
            CstepError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            CstepError::ParseFailed { .. } => OutputErrorCode::ResolutionError,
            CstepError::RoundTripFailed { .. } => OutputErrorCode::BuildFailed,
            CstepError::BatchFailed { .. } => OutputErrorCode::BuildFailed,
            CstepError::MetadataPrecondition { .. } => OutputErrorCode::PreconditionFailed,
            CstepError::ContractViolation { .. } => OutputErrorCode::InternalError,
            CstepError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<CstepError> for OutputErrorCode {
    fn from(err: CstepError) -> Self {
        OutputErrorCode::from(&err)
    }
}

impl From<std::io::Error> for CstepError {
    fn from(err: std::io::Error) -> Self {
        CstepError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for CstepError {
    fn from(err: serde_json::Error) -> Self {
        CstepError::InternalError {
            message: format!("JSON error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl CstepError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        CstepError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        CstepError::FileNotFound { path: path.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CstepError::InternalError {
            message: message.into(),
        }
    }

    /// Attach a file name to errors that carry one but were raised
    /// before the file was known.
    pub fn in_file(self, path: impl Into<String>) -> Self {
        match self {
            CstepError::RoundTripFailed {
                message,
                file: None,
            } => CstepError::RoundTripFailed {
                message,
                file: Some(path.into()),
            },
            CstepError::ParseFailed {
                file,
                line,
                col,
                message,
            } if file.is_empty() => CstepError::ParseFailed {
                file: path.into(),
                line,
                col,
                message,
            },
            other => other,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
