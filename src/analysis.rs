//! Analysis data model: the image sent to the model and the structured result it returns.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;

use crate::error::{LogoVerifyError, Result};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Instruction sent alongside the image
pub const ANALYSIS_PROMPT: &str = "You are a brand identification and logo authenticity expert. \
Identify the brand shown in this logo image. Describe the company, its founding background, \
and the symbolic meaning of the logo's design elements. Then estimate how similar this image \
is to the brand's official logo as a percentage from 0 to 100, where 100 means identical to \
the genuine logo. Finally, interpret what that score implies about the logo's originality \
(for example whether it looks like the genuine mark, a dated variant, or a counterfeit). \
If the brand cannot be identified, say so in brandName and use a low similarity score.";

/// Structured output describing a logo's identified brand and authenticity assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub brand_name: String,
    pub company_info: String,
    pub founding_background: String,
    pub symbolic_meaning: String,
    pub similarity_percentage: f64,
    pub originality_interpretation: String,
}

impl AnalysisResult {
    /// Clamp the similarity score into 0..=100
    pub fn normalized(mut self) -> Self {
        let score = self.similarity_percentage;
        if !score.is_finite() {
            tracing::warn!("Model returned a non-finite similarity score, using 0");
            self.similarity_percentage = 0.0;
        } else if !(0.0..=100.0).contains(&score) {
            tracing::warn!("Similarity score {} out of range, clamping", score);
            self.similarity_percentage = score.clamp(0.0, 100.0);
        }
        self
    }
}

/// JSON schema passed to the model as `responseSchema`; every property is required
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "brandName": {
                "type": "STRING",
                "description": "Name of the brand the logo belongs to"
            },
            "companyInfo": {
                "type": "STRING",
                "description": "Short description of the company behind the brand"
            },
            "foundingBackground": {
                "type": "STRING",
                "description": "When, where and by whom the company was founded"
            },
            "symbolicMeaning": {
                "type": "STRING",
                "description": "Meaning of the logo's shapes, colors and typography"
            },
            "similarityPercentage": {
                "type": "NUMBER",
                "description": "Similarity to the official logo, 0 to 100"
            },
            "originalityInterpretation": {
                "type": "STRING",
                "description": "What the similarity score implies about authenticity"
            }
        },
        "required": [
            "brandName",
            "companyInfo",
            "foundingBackground",
            "symbolicMeaning",
            "similarityPercentage",
            "originalityInterpretation"
        ],
        "propertyOrdering": [
            "brandName",
            "companyInfo",
            "foundingBackground",
            "symbolicMeaning",
            "similarityPercentage",
            "originalityInterpretation"
        ]
    })
}

/// An in-memory image ready to be sent inline
#[derive(Debug, Clone)]
pub struct ImagePayload {
    base64: String,
    mime_type: String,
}

impl ImagePayload {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            base64: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Wrap an already-encoded image. A `data:<mime>;base64,` prefix is stripped.
    pub fn from_base64(data: &str, mime_type: Option<&str>) -> Result<Self> {
        let (prefix_mime, payload) = match data.strip_prefix("data:") {
            Some(rest) => {
                let (header, body) = rest.split_once(',').ok_or_else(|| {
                    LogoVerifyError::validation("imageBase64 data URL has no payload")
                })?;
                let mime = header.strip_suffix(";base64").unwrap_or(header);
                (Some(mime.to_string()), body)
            }
            None => (None, data),
        };

        let payload = payload.trim();
        if payload.is_empty() {
            return Err(LogoVerifyError::validation("imageBase64 is empty"));
        }

        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .or(prefix_mime.filter(|m| !m.is_empty()))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        Ok(Self {
            base64: payload.to_string(),
            mime_type,
        })
    }

    /// Read an image file, inferring the MIME type from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime = mime_from_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| LogoVerifyError::Io {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        if bytes.is_empty() {
            return Err(LogoVerifyError::validation(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Self::from_bytes(&bytes, mime))
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

fn mime_from_path(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        "gif" => Ok("image/gif"),
        "heic" => Ok("image/heic"),
        "heif" => Ok("image/heif"),
        other => Err(LogoVerifyError::validation(format!(
            "unsupported image extension '{}' for {}",
            other,
            path.display()
        ))),
    }
}
