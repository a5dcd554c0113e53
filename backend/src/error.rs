//! Error types for the landing page analysis pipeline.
//!
//! - [`ParseError`] - the uploaded table could not be decoded or tokenised
//! - [`SchemaError`] - no sessions column could be resolved
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP boundary errors
//!
//! Per-row problems (missing fields, bad numbers, business rules) are never
//! errors: those rows are excluded and reported through a
//! [`DiagnosticSink`](crate::transform::diagnostics::DiagnosticSink).

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors while turning raw bytes into a table.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Input has no content at all.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Only `#` preamble lines, no header row.
    #[error("CSV file contains only comment lines ({0} skipped), no header row")]
    OnlyPreamble(usize),

    /// Header row has no usable cells.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Tokenizer rejected the content.
    #[error("Invalid CSV format at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        ParseError::Malformed {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The sessions column is the only hard-required column.
#[derive(Debug, Error)]
#[error("Missing required sessions column (looked for '{}', found: {})", .expected, .found.join(", "))]
pub struct SchemaError {
    /// Header name the resolver fell back to.
    pub expected: String,
    /// Headers actually present in the file.
    pub found: Vec<String>,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::analyze_bytes`] and friends.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input table could not be parsed.
    #[error("CSV error: {0}")]
    Parse(#[from] ParseError),

    /// Required column missing.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// IO outside of parsing (writing outputs).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the failure is caused by the uploaded file rather than the server.
    pub fn is_user_error(&self) -> bool {
        matches!(self, PipelineError::Parse(_) | PipelineError::Schema(_))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let parse_err = ParseError::EmptyFile;
        let pipeline_err: PipelineError = parse_err.into();
        assert!(pipeline_err.to_string().contains("empty"));
        assert!(pipeline_err.is_user_error());

        let schema_err = SchemaError {
            expected: "Sessions".into(),
            found: vec!["Landing page".into(), "Users".into()],
        };
        let pipeline_err: PipelineError = schema_err.into();
        let msg = pipeline_err.to_string();
        assert!(msg.contains("Sessions"));
        assert!(msg.contains("Landing page, Users"));
    }

    #[test]
    fn test_io_error_is_not_user_error() {
        let err: PipelineError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_malformed_format() {
        let err = ParseError::Malformed {
            line: 7,
            message: "bad quote".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("bad quote"));
    }
}
