//! # Landing Insights - best and worst landing pages per marketing channel
//!
//! Takes an analytics export (landing page, channel, sessions, key events),
//! drops rows that fail validation or the business rules, computes each
//! page's conversion rate and ranks pages within every channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│  Rankings   │
//! │ (# preamble)│     │  (auto-enc) │     │ (rules+rate)│     │  + export   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use landing_insights::{analyze_file, PipelineOptions};
//!
//! let analysis = analyze_file("export.csv", &PipelineOptions::default()).unwrap();
//! for channel in &analysis.output.channel_results {
//!     println!("{}: {} top pages", channel.channel_name, channel.top5.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Rows, records and channel results
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Column resolution, filtering, ranking, pipeline
//! - [`export`] - Downloadable CSV
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ParseError, PipelineError, SchemaError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ChannelResult, LandingPageRecord, PageCandidate, RawRow};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, format_delimiter, parse_bytes_auto,
    parse_file_auto, parse_str, strip_preamble, ParsedTable,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    analyze_bytes, analyze_file, analyze_table, resolve_columns, run_pipeline, run_records,
    Analysis, CanonicalField, ColumnMap, CsvInfo, DiagnosticSink, Exclusion, ExclusionLog,
    ExclusionReason, NoopSink, PipelineOptions, PipelineOutput, RowStats,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export_file_name, to_csv, write_csv, ExportRow, EXPORT_HEADERS};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, AnalyzeResponse, CsvMetadata, ResponseMetadata};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
