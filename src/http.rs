//! HTTP transport for logo-verify
//!
//! Axum server with the browser UI at `/`, the analysis passthrough at
//! `/api/analyze-logo` and the report submission endpoint at `/api/report-logo`.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::analysis::{AnalysisResult, ImagePayload};
use crate::clients::{GeminiClient, LogoAnalyzer};
use crate::config::Config;
use crate::error::{LogoVerifyError, Result};
use crate::report::AnalysisReport;
use crate::store::{NewReport, ReportStore, SurrealReportStore};

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Body of `POST /api/analyze-logo`
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Body of `POST /api/report-logo`
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub success: bool,
    pub report_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Arc<dyn LogoAnalyzer>,
    pub store: Arc<dyn ReportStore>,
}

impl AppState {
    /// Production wiring: Gemini for analysis, SurrealDB for reports
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let analyzer = GeminiClient::from_config(&config)?;
        tracing::info!("Logo analysis via Gemini model {}", analyzer.model());
        Ok(Self {
            store: Arc::new(SurrealReportStore::new(config.clone())),
            analyzer: Arc::new(analyzer),
            config,
        })
    }
}

// Over-limit bodies keep their 413; every other rejection is a 400
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(inner)| inner).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            LogoVerifyError::payload_too_large(format!(
                "Request body exceeds the configured limit: {}",
                rejection.body_text()
            ))
        } else {
            LogoVerifyError::validation(format!("Invalid request body: {}", rejection.body_text()))
        }
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

pub async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

/// POST /api/analyze-logo - one inference call for the uploaded image
pub async fn analyze_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisReport>> {
    let req = json_body(body)?;
    let image_base64 = non_empty(req.image_base64)
        .ok_or_else(|| LogoVerifyError::validation("Missing required fields: imageBase64"))?;
    let image = ImagePayload::from_base64(&image_base64, req.mime_type.as_deref())?;

    let analysis = state.analyzer.analyze(&image).await?;
    Ok(Json(AnalysisReport::new(analysis)))
}

/// POST /api/report-logo - write one suspicious-logo report
pub async fn report_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>> {
    let req = json_body(body)?;
    let image_base64 = non_empty(req.image_base64);

    let mut missing = Vec::new();
    if req.analysis.is_none() {
        missing.push("analysis");
    }
    if image_base64.is_none() {
        missing.push("imageBase64");
    }
    let (Some(analysis), Some(image_base64)) = (req.analysis, image_base64) else {
        return Err(LogoVerifyError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    let image = ImagePayload::from_base64(&image_base64, req.mime_type.as_deref())?;
    let report_id = state
        .store
        .create_report(NewReport {
            analysis,
            image_base64: image.base64().to_string(),
            mime_type: image.mime_type().to_string(),
        })
        .await?;

    Ok(Json(ReportResponse {
        success: true,
        report_id,
    }))
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let max_body = state.config.http.max_body_bytes;

    let api = Router::new()
        .route("/analyze-logo", post(analyze_handler))
        .route("/report-logo", post(report_handler));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(config: Arc<Config>) -> Result<()> {
    let bind = config.http.bind;
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener on {}: {}", bind, e))?;

    tracing::info!("Starting HTTP server on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_request_wire_names() {
        let req: ReportRequest =
            serde_json::from_str(r#"{"imageBase64":"AAAA","mimeType":"image/png"}"#).unwrap();
        assert!(req.analysis.is_none());
        assert_eq!(req.image_base64.as_deref(), Some("AAAA"));
        assert_eq!(req.mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_report_response_wire_names() {
        let value = serde_json::to_value(ReportResponse {
            success: true,
            report_id: "r1".into(),
        })
        .unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["reportId"], "r1");
    }

    #[test]
    fn test_index_is_embedded() {
        assert!(INDEX_HTML.contains("/api/report-logo"));
        assert!(INDEX_HTML.contains("/api/analyze-logo"));
    }

    #[test]
    fn test_index_reset_restores_report_button() {
        let start = INDEX_HTML.find("function resetResult()").unwrap();
        let end = start + INDEX_HTML[start..].find("\n  }").unwrap();
        let reset = &INDEX_HTML[start..end];
        assert!(reset.contains("$('report-btn').disabled = false;"));
        assert!(reset.contains("$('report-btn').textContent = 'Report as suspicious';"));
    }
}
