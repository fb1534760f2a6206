//! Gemini adapter
//!
//! Gemini gets no structured-output mechanism. The research instructions are
//! concatenated with the query into a single prompt that asks for a bare
//! JSON object, and the reply text is decoded as-is. A reply wrapped in
//! prose or markdown fences is rejected rather than repaired.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_body, send_error, ProviderAdapter};
use crate::error::ResearchError;
use crate::prompts::gemini_prompt;
use crate::schema::ResearchPayload;
use crate::types::{Provider, ResearchConfig, DEFAULT_TEMPERATURE};

/// Public Gemini API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;

const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Adapter for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    client: Client,
    base_url: String,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(model)
        )
    }

    fn build_request(request: &ResearchConfig) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: gemini_prompt(request.query()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature().unwrap_or(DEFAULT_TEMPERATURE),
                top_p: TOP_P,
                top_k: TOP_K,
            },
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: BLOCK_THRESHOLD,
                })
                .collect(),
        }
    }

    /// Extract the reply text from a `generateContent` response.
    fn response_text(body: &str) -> Result<String, ResearchError> {
        let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
            ResearchError::malformed(
                Provider::Gemini,
                format!("Unexpected generateContent format: {}", e),
            )
        })?;

        let candidate = match parsed.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                let reason = parsed
                    .prompt_feedback
                    .and_then(|feedback| feedback.block_reason);
                return Err(match reason {
                    Some(reason) => ResearchError::malformed(
                        Provider::Gemini,
                        format!("Prompt was blocked: {}", reason),
                    ),
                    None => ResearchError::malformed(
                        Provider::Gemini,
                        "No response received from the model",
                    ),
                });
            }
        };

        let text: String = candidate
            .content
            .map(|content| content.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(ResearchError::malformed(
                Provider::Gemini,
                format!("No response received from the model (finish reason: {})", reason),
            ));
        }

        Ok(text)
    }

    fn parse_response(body: &str) -> Result<ResearchPayload, ResearchError> {
        let text = Self::response_text(body)?;

        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            ResearchError::malformed(
                Provider::Gemini,
                format!("The model did not return valid JSON: {}", e),
            )
        })?;

        ResearchPayload::from_value(Provider::Gemini, value)
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    async fn run(&self, request: &ResearchConfig) -> Result<ResearchPayload, ResearchError> {
        let model = request.effective_model();
        let body = Self::build_request(request);

        debug!(
            model,
            temperature = body.generation_config.temperature,
            "Sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint_url(model))
            .query(&[("key", request.api_key().trim())])
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(Provider::Gemini, e))?;

        let text = read_body(Provider::Gemini, response).await?;
        Self::parse_response(&text)
    }

    fn name(&self) -> &str {
        Provider::Gemini.as_str()
    }

    fn default_model(&self) -> &str {
        Provider::Gemini.default_model()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
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
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
