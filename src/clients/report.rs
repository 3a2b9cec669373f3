use std::time::Duration;

use crate::analysis::{AnalysisResult, ImagePayload};
use crate::error::{LogoVerifyError, Result};
use crate::http::{ErrorBody, ReportRequest, ReportResponse};

/// Client for a running server's `/api/report-logo` endpoint
#[derive(Debug, Clone)]
pub struct ReportClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReportClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LogoVerifyError::Internal {
                message: format!("Failed to build reqwest client with timeout: {}", e),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Submit one suspicious-logo report and return the generated report id
    pub async fn submit(&self, analysis: &AnalysisResult, image: &ImagePayload) -> Result<String> {
        let body = ReportRequest {
            analysis: Some(analysis.clone()),
            image_base64: Some(image.base64().to_string()),
            mime_type: Some(image.mime_type().to_string()),
        };

        let response = self
            .http
            .post(format!("{}/api/report-logo", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| LogoVerifyError::store(format!("report request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(if status.is_client_error() {
                LogoVerifyError::validation(message)
            } else {
                LogoVerifyError::store(message)
            });
        }

        let parsed: ReportResponse = response
            .json()
            .await
            .map_err(|e| LogoVerifyError::store(format!("invalid report response: {}", e)))?;
        Ok(parsed.report_id)
    }
}
