//! High-level pipeline API: parse, resolve, validate, filter, rank.
//!
//! [`run_pipeline`] is the pure transform over an in-memory table. The
//! `analyze_*` functions wrap it with parsing and progress logging.
//!
//! # Example
//!
//! ```rust,ignore
//! use landing_insights::transform::pipeline::{analyze_file, PipelineOptions};
//!
//! let analysis = analyze_file("export.csv", &PipelineOptions::default())?;
//! for channel in &analysis.output.channel_results {
//!     println!("{}: {} pages", channel.channel_name, channel.len());
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use super::columns::{CanonicalField, ColumnMap};
use super::diagnostics::{DiagnosticSink, Exclusion, ExclusionCount};
use super::grouper::group_by_channel;
use super::metrics::enrich;
use super::normalize::{landing_page_of, normalize_row};
use super::ranker::rank_channels;
use super::rules;
use crate::api::logs::{log_info, log_success, log_warning, BroadcastSink};
use crate::error::{PipelineResult, SchemaError};
use crate::export::ExportRow;
use crate::models::{ChannelResult, RawRow};
use crate::parser::{format_delimiter, parse_bytes_auto, parse_file_auto, ParsedTable};

/// Business rule thresholds and ranking size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Rows with fewer sessions are dropped
    pub min_sessions: i64,

    /// Rows with fewer transactions are dropped
    pub min_transactions: i64,

    /// Landing pages containing any of these (case-insensitive) are dropped
    pub excluded_terms: Vec<String>,

    /// Drop landing pages that are exactly `/` before grouping
    pub exclude_root_page: bool,

    /// Size of the top and bottom slices
    pub slice_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            min_sessions: 50,
            min_transactions: 10,
            excluded_terms: vec!["book".into(), "checkout".into(), "purchase".into()],
            exclude_root_page: false,
            slice_size: 5,
        }
    }
}

/// Row counts at each stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowStats {
    pub total_rows: usize,
    /// Passed presence and numeric checks
    pub valid_rows: usize,
    /// Passed the business rules
    pub qualifying_rows: usize,
    /// Placed into a channel group
    pub grouped_rows: usize,
    pub channels: usize,
}

/// What one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub channel_results: Vec<ChannelResult>,
    pub export_rows: Vec<ExportRow>,
    pub columns: ColumnMap,
    pub stats: RowStats,
}

/// Run the transform over a materialised table.
///
/// `headers` drives column resolution; every row lookup goes through the
/// resolved [`ColumnMap`]. Rows that fail any check are reported to `sink`
/// and skipped. Only a missing sessions column is an error, and only when
/// there is at least one data row: a header-only table yields an empty result.
pub fn run_pipeline(
    headers: &[String],
    records: &[RawRow],
    options: &PipelineOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<PipelineOutput, SchemaError> {
    let columns = if records.is_empty() {
        ColumnMap::infer(headers)
    } else {
        ColumnMap::resolve(headers)?
    };

    let mut stats = RowStats {
        total_rows: records.len(),
        ..RowStats::default()
    };
    let mut qualifying = Vec::new();

    for (index, row) in records.iter().enumerate() {
        let candidate = match normalize_row(index, row, &columns) {
            Ok(candidate) => candidate,
            Err(reason) => {
                sink.exclude(Exclusion {
                    row: index,
                    landing_page: landing_page_of(row, &columns),
                    reason,
                });
                continue;
            }
        };
        stats.valid_rows += 1;

        if let Err(reason) = rules::check(&candidate, options) {
            sink.exclude(Exclusion {
                row: index,
                landing_page: Some(candidate.landing_page),
                reason,
            });
            continue;
        }

        qualifying.push(enrich(candidate));
    }
    stats.qualifying_rows = qualifying.len();

    let export_rows = qualifying.iter().map(ExportRow::from).collect();

    let groups = group_by_channel(&qualifying, options.exclude_root_page, sink);
    stats.grouped_rows = groups.iter().map(|g| g.records.len()).sum();
    stats.channels = groups.len();

    let channel_results = rank_channels(groups, options.slice_size);

    Ok(PipelineOutput {
        channel_results,
        export_rows,
        columns,
        stats,
    })
}

/// Run the transform over JSON objects, resolving columns from the first one.
///
/// Non-object values are treated as empty rows.
pub fn run_records(
    records: &[Value],
    options: &PipelineOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<PipelineOutput, SchemaError> {
    let rows: Vec<RawRow> = records
        .iter()
        .map(|v| v.as_object().cloned().unwrap_or_default())
        .collect();
    let headers: Vec<String> = rows
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();

    run_pipeline(&headers, &rows, options, sink)
}

/// Parsing metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
    pub skipped_preamble: usize,
}

impl From<&ParsedTable> for CsvInfo {
    fn from(table: &ParsedTable) -> Self {
        Self {
            encoding: table.encoding.clone(),
            delimiter: table.delimiter,
            headers: table.headers.clone(),
            row_count: table.records.len(),
            skipped_preamble: table.skipped_preamble,
        }
    }
}

/// Pipeline output plus parsing metadata and exclusion counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub output: PipelineOutput,
    pub csv_info: CsvInfo,
    pub exclusions: Vec<ExclusionCount>,
}

/// Analyse a CSV file.
pub fn analyze_file<P: AsRef<Path>>(path: P, options: &PipelineOptions) -> PipelineResult<Analysis> {
    log_info(format!("📖 Reading {}", path.as_ref().display()));
    let table = parse_file_auto(path)?;
    analyze_table(&table, options)
}

/// Analyse uploaded CSV bytes.
pub fn analyze_bytes(bytes: &[u8], options: &PipelineOptions) -> PipelineResult<Analysis> {
    log_info(format!("📖 Reading upload ({} bytes)", bytes.len()));
    let table = parse_bytes_auto(bytes)?;
    analyze_table(&table, options)
}

/// Analyse an already parsed table, logging each stage.
pub fn analyze_table(table: &ParsedTable, options: &PipelineOptions) -> PipelineResult<Analysis> {
    let csv_info = CsvInfo::from(table);

    log_success(format!("Detected encoding: {}", csv_info.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(csv_info.delimiter)));
    if csv_info.skipped_preamble > 0 {
        log_info(format!("Skipped {} comment line(s) before the header", csv_info.skipped_preamble));
    }
    log_success(format!("Read {} rows, {} columns", csv_info.row_count, csv_info.headers.len()));

    let mut sink = BroadcastSink::default();
    let output = match run_pipeline(&table.headers, &table.records, options, &mut sink) {
        Ok(output) => output,
        Err(e) => {
            log_warning(e.to_string());
            return Err(e.into());
        }
    };

    print_column_map(&output.columns, &table.headers);
    let exclusions = sink.finish();
    print_stats(&output.stats);

    Ok(Analysis {
        output,
        csv_info,
        exclusions,
    })
}

fn print_column_map(columns: &ColumnMap, headers: &[String]) {
    log_info("🗺️  Column mapping:");
    let unmatched = columns.unmatched(headers);
    for field in CanonicalField::ALL {
        let header = columns.header(field);
        if unmatched.contains(&field) {
            log_warning(format!("{} → '{}' (default, not in file)", field, header));
        } else {
            log_info(format!("{} → '{}'", field, header));
        }
    }
}

fn print_stats(stats: &RowStats) {
    log_success(format!("{} of {} rows valid", stats.valid_rows, stats.total_rows));
    log_success(format!("{} rows pass the business rules", stats.qualifying_rows));
    if stats.channels == 0 {
        log_warning("No landing pages qualified");
    } else {
        log_success(format!("{} channels ranked", stats.channels));
    }
}
