//! REST API types.
//!
//! The response carries the same `channelResults` the frontend renders as
//! tabs plus the flat `exportRows` behind the download button.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::export::ExportRow;
use crate::models::ChannelResult;
use crate::transform::columns::ColumnMap;
use crate::transform::diagnostics::ExclusionCount;
use crate::transform::pipeline::{Analysis, RowStats};

/// Response sent after an upload has been analysed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// Unique job identifier
    pub job_id: String,

    /// `"ready"`, or `"empty"` when no landing page qualified
    pub status: String,

    pub channel_results: Vec<ChannelResult>,

    pub export_rows: Vec<ExportRow>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub csv_info: CsvMetadata,
    pub columns: ColumnMap,
    pub rows: RowStats,
    pub exclusions: Vec<ExclusionCount>,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub skipped_preamble: usize,
    pub columns: Vec<String>,
}

impl From<Analysis> for AnalyzeResponse {
    fn from(analysis: Analysis) -> Self {
        let Analysis {
            output,
            csv_info,
            exclusions,
        } = analysis;

        let status = if output.channel_results.is_empty() {
            "empty"
        } else {
            "ready"
        };

        AnalyzeResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            channel_results: output.channel_results,
            export_rows: output.export_rows,
            metadata: ResponseMetadata {
                csv_info: CsvMetadata {
                    encoding: csv_info.encoding,
                    delimiter: csv_info.delimiter.to_string(),
                    row_count: csv_info.row_count,
                    skipped_preamble: csv_info.skipped_preamble,
                    columns: csv_info.headers,
                },
                columns: output.columns,
                rows: output.stats,
                exclusions,
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "channelResults": [],
        "exportRows": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::pipeline::{analyze_bytes, PipelineOptions};

    #[test]
    fn test_response_from_analysis() {
        let csv = "# meta\nLanding page,Sessions,Session default channel group,Key events\n/shoes,100,Organic,20\n";
        let analysis = analyze_bytes(csv.as_bytes(), &PipelineOptions::default()).unwrap();
        let response = AnalyzeResponse::from(analysis);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ready");
        assert_eq!(json["channelResults"][0]["channelName"], "Organic");
        assert_eq!(json["channelResults"][0]["top5"][0]["conversionRate"], 20.0);
        assert_eq!(json["exportRows"][0]["conversionRate"], "20.00");
        assert_eq!(json["metadata"]["csvInfo"]["skippedPreamble"], 1);
        assert_eq!(json["metadata"]["columns"]["sessions"], "Sessions");
        assert_eq!(json["metadata"]["rows"]["qualifyingRows"], 1);
        assert!(Uuid::parse_str(json["jobId"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_empty_status() {
        let csv = "Landing page,Sessions\n/a,10\n";
        let analysis = analyze_bytes(csv.as_bytes(), &PipelineOptions::default()).unwrap();
        assert_eq!(AnalyzeResponse::from(analysis).status, "empty");
    }

    #[test]
    fn test_error_response() {
        let value = error_response("Missing required sessions column");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "Missing required sessions column");
        assert!(value["channelResults"].as_array().unwrap().is_empty());
    }
}
