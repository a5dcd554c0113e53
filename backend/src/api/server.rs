//! HTTP server for the analysis API.
//!
//! # API Endpoints
//!
//! | Method | Path                      | Description                        |
//! |--------|---------------------------|------------------------------------|
//! | GET    | `/health`                 | Health check                       |
//! | POST   | `/api/process-csv`        | Upload CSV, get channel rankings   |
//! | POST   | `/api/process-csv/export` | Upload CSV, download export CSV    |
//! | GET    | `/api/logs`               | SSE stream for real-time logs      |

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, AnalyzeResponse};
use crate::error::ServerError;
use crate::export::{export_file_name, to_csv};
use crate::transform::pipeline::{analyze_bytes, Analysis, PipelineOptions};

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

type ApiError = (StatusCode, Json<Value>);

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        let status = match &err {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(e) if e.is_user_error() => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log_error(err.to_string());
        (status, Json(error_response(&err.to_string())))
    }
}

/// Build the application router.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/process-csv", post(process_csv))
        .route("/api/process-csv/export", post(export_csv))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Landing insights server running on http://localhost:{}", port);
    println!("   POST /api/process-csv        - Analyse a CSV export");
    println!("   POST /api/process-csv/export - Download the filtered CSV");
    println!("   GET  /api/logs               - SSE log stream");
    println!("   GET  /health                 - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "landing-insights",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "analyze": "POST /api/process-csv",
            "export": "POST /api/process-csv/export",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Analyse an uploaded CSV and return channel rankings
async fn process_csv(multipart: Multipart) -> Result<Json<AnalyzeResponse>, ApiError> {
    let analysis = analyze_upload(multipart).await?;
    Ok(Json(AnalyzeResponse::from(analysis)))
}

/// Analyse an uploaded CSV and return the export file
async fn export_csv(multipart: Multipart) -> Result<Response, ApiError> {
    let analysis = analyze_upload(multipart).await?;
    let body = to_csv(&analysis.output.export_rows)
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    let file_name = export_file_name(chrono::Utc::now().date_naive());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}

async fn analyze_upload(multipart: Multipart) -> Result<Analysis, ServerError> {
    let (file_name, bytes) = read_upload(multipart).await?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    Ok(analyze_bytes(&bytes, &PipelineOptions::default())?)
}

/// Pull the `file` field out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<(Option<String>, Vec<u8>), ServerError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file uploaded".into()))?;
    Ok((file_name, bytes))
}
