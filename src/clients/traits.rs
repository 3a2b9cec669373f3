use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::{AnalysisResult, ImagePayload};
use crate::error::LogoVerifyError;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("http error: {0}")]
    Http(String),
    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("prompt blocked by the model: {0}")]
    Blocked(String),
    #[error("model returned no text content")]
    EmptyResponse,
    #[error("parse error: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnalyzerError::Http(format!("request timed out: {}", err))
        } else {
            AnalyzerError::Http(err.to_string())
        }
    }
}

impl From<AnalyzerError> for LogoVerifyError {
    fn from(err: AnalyzerError) -> Self {
        LogoVerifyError::inference(err.to_string())
    }
}

/// One-shot brand identification and authenticity scoring of a logo image
#[async_trait]
pub trait LogoAnalyzer: Send + Sync {
    async fn analyze(&self, image: &ImagePayload) -> Result<AnalysisResult, AnalyzerError>;
}
