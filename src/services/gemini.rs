use crate::errors::GenerationError;
use crate::models::config::ProviderConfig;
use crate::models::generation::ContentPart;
use crate::services::generation::ContentProvider;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Google Gemini `generateContent` over REST.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("moodboard-gateway/1.0");
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }
}

#[async_trait]
impl ContentProvider for GeminiProvider {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<Vec<ContentPart>, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| GenerationError::Provider {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            message: "GEMINI_API_KEY not configured".to_string(),
        })?;

        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        });

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Gemini request rejected");
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        parse_parts(&body)
    }
}

/// Extracts the ordered parts of the first candidate.
fn parse_parts(body: &str) -> Result<Vec<ContentPart>, GenerationError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    if parsed.candidates.is_empty() {
        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationError::Provider {
                status: StatusCode::OK.as_u16(),
                message: format!("Prompt blocked by provider: {reason}"),
            });
        }
    }

    Ok(parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default())
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("Provider returned {status}")
            } else {
                trimmed.chars().take(500).collect()
            }
        })
}
