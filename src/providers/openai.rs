//! OpenAI adapter
//!
//! Sends one chat completion with a system turn and the user's query, and
//! forces the model to answer by calling [`RESEARCH_FUNCTION_NAME`]. The
//! function-call arguments are the research object, so no free-text parsing
//! is involved.

use async_trait::async_trait;
use reqwest::Client;
use rig::completion::ToolDefinition;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{read_body, send_error, ProviderAdapter};
use crate::error::ResearchError;
use crate::prompts::{research_function, OPENAI_SYSTEM_PROMPT, RESEARCH_FUNCTION_NAME};
use crate::schema::ResearchPayload;
use crate::types::{Provider, ResearchConfig};

/// Public OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Adapter for OpenAI-compatible chat completion endpoints.
///
/// The API key comes with each request; the adapter itself only holds the
/// HTTP client and base URL.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    client: Client,
    base_url: String,
}

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the adapter at another OpenAI-compatible endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, ...).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(request: &'a ResearchConfig) -> ChatRequest<'a> {
        ChatRequest {
            model: request.effective_model(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: OPENAI_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: request.query(),
                },
            ],
            functions: vec![research_function()],
            function_call: FunctionCallChoice {
                name: RESEARCH_FUNCTION_NAME,
            },
        }
    }

    fn parse_response(body: &str) -> Result<ResearchPayload, ResearchError> {
        let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
            ResearchError::malformed(
                Provider::OpenAi,
                format!("Unexpected chat completion format: {}", e),
            )
        })?;

        let arguments = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.function_call)
            .map(|call| call.arguments)
            .ok_or_else(|| {
                ResearchError::malformed(Provider::OpenAi, "No response received from the model")
            })?;

        let value: serde_json::Value = serde_json::from_str(&arguments).map_err(|e| {
            ResearchError::malformed(
                Provider::OpenAi,
                format!("Failed to parse model response: {}", e),
            )
        })?;

        ResearchPayload::from_value(Provider::OpenAi, value)
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    async fn run(&self, request: &ResearchConfig) -> Result<ResearchPayload, ResearchError> {
        let body = Self::build_request(request);

        debug!(
            model = body.model,
            base_url = %self.base_url,
            "Sending OpenAI chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(request.api_key().trim())
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(Provider::OpenAi, e))?;

        let text = read_body(Provider::OpenAi, response).await?;
        Self::parse_response(&text)
    }

    fn name(&self) -> &str {
        Provider::OpenAi.as_str()
    }

    fn default_model(&self) -> &str {
        Provider::OpenAi.default_model()
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    functions: Vec<ToolDefinition>,
    function_call: FunctionCallChoice<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct FunctionCallChoice<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    #[serde(default)]
    arguments: String,
}


/// HTTP tests against a mocked OpenAI endpoint
#[cfg(test)]
mod http_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn success_body() -> serde_json::Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "function_call": {
                        "name": RESEARCH_FUNCTION_NAME,
                        "arguments": "{\"answer\":\"Borrow checking\",\"followUpQuestions\":[\"What are lifetimes?\"],\"confidence\":0.9}"
                    }
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_http_successful_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "function_call": {"name": RESEARCH_FUNCTION_NAME}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(mock_server.uri());
        let config = ResearchConfig::new(Provider::OpenAi, "sk-test", "How does Rust manage memory?");

        let payload = adapter.run(&config).await.unwrap();

        assert_eq!(payload.answer, "Borrow checking");
        assert_eq!(payload.confidence, 0.9);
    }

    #[tokio::test]
    async fn test_http_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided: sk-bad", "type": "invalid_request_error"}
            })))
            .mount(&mock_server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(mock_server.uri());
        let config = ResearchConfig::new(Provider::OpenAi, "sk-bad", "q");

        let err = adapter.run(&config).await.unwrap_err();

        assert!(matches!(err, ResearchError::Auth { .. }));
        assert_eq!(err.to_string(), "API Error: Incorrect API key provided: sk-bad");
    }

    #[tokio::test]
    async fn test_http_server_error_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal server error"))
            .mount(&mock_server)
            .await;

        let adapter = OpenAiAdapter::with_base_url(mock_server.uri());
        let config = ResearchConfig::new(Provider::OpenAi, "sk-test", "q");

        let err = adapter.run(&config).await.unwrap_err();

        assert!(matches!(err, ResearchError::Transport { status: Some(500), .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("Internal server error"));
    }

    #[tokio::test]
    async fn test_http_connection_refused() {
        // Nothing listens on port 9 (discard) in the test environment
        let adapter = OpenAiAdapter::with_base_url("http://127.0.0.1:9");
        let config = ResearchConfig::new(Provider::OpenAi, "sk-test", "q");

        let err = adapter.run(&config).await.unwrap_err();

        assert!(matches!(err, ResearchError::Transport { status: None, .. }));
    }
}
