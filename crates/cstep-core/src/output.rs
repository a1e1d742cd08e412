//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Structured JSON:** every command prints exactly one JSON document to stdout
//! 2. **Status first:** every response has `status` as first field
//! 3. **Deterministic:** same input -> same output (field order, array ordering)
//! 4. **Nullable vs absent:** absent field means "not applicable"
//! 5. **Versioned:** schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{CstepError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Errors
// ============================================================================

/// Source location attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub file: String,
    pub line: u32,
    pub col: u32,
}

/// Error payload shared by error responses and per-file batch outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Where the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ErrorLocation>,
}

impl ErrorInfo {
    /// Create from a CstepError.
    pub fn from_error(err: &CstepError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, location) = match err {
            CstepError::InvalidArguments { details, .. } => (details.clone(), None),
            CstepError::Config { path, .. } => (Some(serde_json::json!({ "path": path })), None),
            CstepError::FileNotFound { path } => (Some(serde_json::json!({ "path": path })), None),
            CstepError::ParseFailed {
                file, line, col, ..
            } => (
                None,
                Some(ErrorLocation {
                    file: file.clone(),
                    line: *line,
                    col: *col,
                }),
            ),
            CstepError::RoundTripFailed { file, .. } => (
                file.as_ref().map(|f| serde_json::json!({ "file": f })),
                None,
            ),
            CstepError::MetadataPrecondition { node_kind, .. } => (
                node_kind
                    .as_ref()
                    .map(|k| serde_json::json!({ "nodeKind": k })),
                None,
            ),
            CstepError::BatchFailed { details, .. } => (Some(details.clone()), None),
            CstepError::ContractViolation { .. } | CstepError::InternalError { .. } => {
                (None, None)
            }
        };

        ErrorInfo {
            code,
            message,
            details,
            location,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a CstepError.
    pub fn from_error(err: &CstepError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Rewrite
// ============================================================================

/// Outcome for a single file of a rewrite batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// Input path as given (or as discovered while walking a directory).
    pub input: String,
    /// "ok" or "error".
    pub status: String,
    /// Path of the instrumented C file written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumented: Option<String>,
    /// Path of the metadata JSON written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// Number of notify events recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<usize>,
    /// Number of CST nodes indexed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
    /// Instrumented source, when returned inline instead of written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumented_source: Option<String>,
    /// Metadata document, when returned inline instead of written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_document: Option<serde_json::Value>,
    /// Failure, when `status` is "error".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl FileOutcome {
    /// Outcome of a file that failed; nothing was written for it.
    pub fn failed(input: impl Into<String>, err: &CstepError) -> Self {
        FileOutcome {
            input: input.into(),
            status: "error".to_string(),
            instrumented: None,
            metadata: None,
            events: None,
            nodes: None,
            instrumented_source: None,
            metadata_document: None,
            error: Some(ErrorInfo::from_error(err)),
        }
    }

    /// True when the file was instrumented.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Response for `cstep rewrite`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteResponse {
    pub status: String,
    pub schema_version: String,
    pub files: Vec<FileOutcome>,
}

impl RewriteResponse {
    pub fn new(files: Vec<FileOutcome>) -> Self {
        RewriteResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files,
        }
    }
}

// ============================================================================
// Verify
// ============================================================================

/// Round-trip verification result for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub file: String,
    /// True when the CST reproduced the source byte-for-byte.
    pub round_trip: bool,
    /// Number of CST nodes built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Response for `cstep verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: String,
    pub schema_version: String,
    pub files: Vec<VerifyOutcome>,
}

impl VerifyResponse {
    pub fn new(files: Vec<VerifyOutcome>) -> Self {
        let status = if files.iter().all(|f| f.round_trip) {
            "ok"
        } else {
            "failed"
        };
        VerifyResponse {
            status: status.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files,
        }
    }
}

// ============================================================================
// Show
// ============================================================================

/// Response for `cstep show`: textual dumps of the pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_tree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_tree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifications: Option<String>,
}

// ============================================================================
// Rename
// ============================================================================

/// Response for `cstep rename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameResponse {
    pub status: String,
    pub schema_version: String,
    pub file: String,
    pub from: String,
    pub to: String,
    /// Number of identifier tokens replaced.
    pub replacements: usize,
    /// Whether the file on disk was updated.
    pub written: bool,
    /// Renamed source, when not written back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Emit a response as compact JSON (single line) to a writer.
pub fn emit_response_compact<T: Serialize>(
    response: &T,
    writer: &mut impl Write,
) -> io::Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_has_status_first() {
        let err = CstepError::file_not_found("missing.c");
        let response = ErrorResponse::from_error(&err);
        let mut buf = Vec::new();
        emit_response_compact(&response, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with(r#"{"status":"error""#));
        assert!(text.contains(r#""code":3"#));
        assert!(text.contains(r#""path":"missing.c""#));
    }

    #[test]
    fn parse_failure_carries_location() {
        let err = CstepError::ParseFailed {
            file: "a.c".to_string(),
            line: 2,
            col: 4,
            message: "expected expression".to_string(),
        };
        let info = ErrorInfo::from_error(&err);
        let location = info.location.unwrap();
        assert_eq!((location.line, location.col), (2, 4));
        assert!(info.details.is_none());
    }

    #[test]
    fn failed_outcome_omits_paths() {
        let outcome = FileOutcome::failed("bad.c", &CstepError::internal("boom"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("instrumented").is_none());
        assert_eq!(json["error"]["code"], 10);
        assert!(!outcome.is_ok());
    }

    #[test]
    fn verify_status_reflects_all_files() {
        let ok = VerifyOutcome {
            file: "a.c".to_string(),
            round_trip: true,
            nodes: Some(4),
            error: None,
        };
        let bad = VerifyOutcome {
            file: "b.c".to_string(),
            round_trip: false,
            nodes: None,
            error: None,
        };
        assert_eq!(VerifyResponse::new(vec![ok.clone()]).status, "ok");
        assert_eq!(VerifyResponse::new(vec![ok, bad]).status, "failed");
    }
}
