use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{ANALYSIS_PROMPT, AnalysisResult, ImagePayload, response_schema};
use crate::clients::traits::{AnalyzerError, LogoAnalyzer};
use crate::config::Config;
use crate::error::{LogoVerifyError, Result};

const ERROR_BODY_CAP_CHARS: usize = 500;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 2],
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Gemini `generateContent` client with a fixed structured-output schema
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LogoVerifyError::Internal {
                message: format!("Failed to build reqwest client with timeout: {}", e),
            })?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            api_base: api_base.into(),
            model: model.into(),
        })
    }

    /// Build from configuration; a missing API key is a hard error
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.gemini_api_key()?;
        Self::new(
            api_key,
            config.inference.api_base.clone(),
            config.inference.model.clone(),
            Duration::from_millis(config.inference.timeout_ms),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl LogoAnalyzer for GeminiClient {
    async fn analyze(&self, image: &ImagePayload) -> std::result::Result<AnalysisResult, AnalyzerError> {
        tracing::debug!(
            "Requesting logo analysis (model={}, mime={}, b64_chars={})",
            self.model,
            image.mime_type(),
            image.base64().len()
        );

        let body = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: [
                    RequestPart::Text {
                        text: ANALYSIS_PROMPT,
                    },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: image.mime_type(),
                            data: image.base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };

        let started = std::time::Instant::now();
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body: truncate_chars(error_text.trim(), ERROR_BODY_CAP_CHARS),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::ParseError(format!("invalid response envelope: {}", e)))?;
        let text = candidate_text(parsed)?;
        let result = parse_analysis_text(&text)?;

        tracing::info!(
            "Logo analysis completed in {}ms: brand='{}', similarity={}",
            started.elapsed().as_millis(),
            result.brand_name,
            result.similarity_percentage
        );
        Ok(result)
    }
}

/// Text of the first candidate's parts, or the reason there is none
fn candidate_text(response: GenerateContentResponse) -> std::result::Result<String, AnalyzerError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|f| f.block_reason)
    {
        return Err(AnalyzerError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(AnalyzerError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.finish_reason
            && reason != "STOP"
        {
            return Err(AnalyzerError::Blocked(reason));
        }
        return Err(AnalyzerError::EmptyResponse);
    }
    Ok(text)
}

/// Parse the model's JSON text, tolerating code fences or prose around the object
pub fn parse_analysis_text(text: &str) -> std::result::Result<AnalysisResult, AnalyzerError> {
    let trimmed = text.trim();
    if let Ok(result) = serde_json::from_str::<AnalysisResult>(trimmed) {
        return Ok(result.normalized());
    }

    let unfenced = strip_code_fence(trimmed);
    if let Ok(result) = serde_json::from_str::<AnalysisResult>(unfenced) {
        return Ok(result.normalized());
    }

    let mut last_err = None;
    for candidate in extract_json_candidates(unfenced).iter().rev() {
        match serde_json::from_str::<AnalysisResult>(candidate) {
            Ok(result) => return Ok(result.normalized()),
            Err(e) => last_err = Some(e),
        }
    }

    let snippet = truncate_chars(trimmed, ERROR_BODY_CAP_CHARS);
    Err(AnalyzerError::ParseError(match last_err {
        Some(e) => format!("model output does not match the analysis schema ({}): {}", e, snippet),
        None => format!("no JSON object found in model output: {}", snippet),
    }))
}

fn strip_code_fence(input: &str) -> &str {
    static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("fence regex should compile")
    });
    FENCE_RE
        .captures(input)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(input)
}

fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut depth: u32 = 0;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0
                        && let Some(s) = start.take()
                    {
                        candidates.push(text[s..idx + 1].to_string());
                    }
                }
            }
            _ => {}
        }
    }

    candidates
}

fn truncate_chars(input: &str, max: usize) -> String {
    let mut out = String::new();
    for (idx, ch) in input.chars().enumerate() {
        if idx >= max {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    out
}
