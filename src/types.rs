//! # Types Module
//!
//! The normalized request and response shared by every provider adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::ResearchPayload;

/// Temperature used for generation when the request does not set one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default for the (currently unused) research depth.
pub const DEFAULT_MAX_DEPTH: u8 = 2;

/// Default for the (currently unused) research breadth.
pub const DEFAULT_MAX_BRANCHES: u8 = 3;

// =============================================================================
// PROVIDER
// =============================================================================
/// A remote LLM vendor the assistant can talk to.
///
/// Names parse case-insensitively; anything other than `openai` or `gemini`
/// is rejected at parse time instead of falling through to a default vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions with a forced function call.
    OpenAi,
    /// Google Gemini generate-content with a JSON-only text prompt.
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
        }
    }

    /// Model used when the request leaves `model` empty.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4-1106-preview",
            Provider::Gemini => "gemini-pro",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            other => Err(format!(
                "unknown provider '{}' (expected 'openai' or 'gemini')",
                other
            )),
        }
    }
}

// =============================================================================
// REQUEST
// =============================================================================
/// One research request, built fresh for every submission.
///
/// The value is immutable once built: the `with_*` methods consume and
/// return it. The API key never shows up in `Debug` output.
///
/// # Example
///
/// ```
/// use ai_research_assistant::{Provider, ResearchConfig};
///
/// let config = ResearchConfig::new(Provider::Gemini, "key", "Why is the sky blue?")
///     .with_temperature(0.2);
///
/// assert_eq!(config.temperature(), Some(0.2));
/// assert_eq!(config.effective_model(), "gemini-pro");
/// ```
#[derive(Clone, PartialEq)]
pub struct ResearchConfig {
    api_key: String,
    provider: Provider,
    model: Option<String>,
    temperature: Option<f64>,
    query: String,
    max_depth: u8,
    max_branches: u8,
}

impl ResearchConfig {
    pub fn new(provider: Provider, api_key: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            provider,
            model: None,
            temperature: None,
            query: query.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_branches: DEFAULT_MAX_BRANCHES,
        }
    }

    /// Set the model id. An empty string falls back to the provider default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model = if model.trim().is_empty() { None } else { Some(model) };
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Accepted and carried; no research traversal reads it.
    pub fn with_max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth;
        self
    }

    /// Accepted and carried; no research traversal reads it.
    pub fn with_max_branches(mut self, branches: u8) -> Self {
        self.max_branches = branches;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// The configured model, or the provider default.
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    pub fn max_branches(&self) -> u8 {
        self.max_branches
    }
}

impl fmt::Debug for ResearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResearchConfig")
            .field("api_key", &"<redacted>")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("query", &self.query)
            .field("max_depth", &self.max_depth)
            .field("max_branches", &self.max_branches)
            .finish()
    }
}

// =============================================================================
// RESPONSE
// =============================================================================
/// The normalized answer to one research request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    /// Always the query of the request that produced this result.
    pub query: String,
    pub answer: String,
    pub follow_up_questions: Vec<String>,
    /// Model-reported, expected in [0, 1] but not clamped.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl ResearchResult {
    /// Attach the request's query to a validated payload.
    ///
    /// The query comes from the request, never from model output.
    pub fn from_payload(query: impl Into<String>, payload: ResearchPayload) -> Self {
        Self {
            query: query.into(),
            answer: payload.answer,
            follow_up_questions: payload.follow_up_questions,
            confidence: payload.confidence,
            sources: payload.sources,
        }
    }
}

// =============================================================================
// HISTORY
// =============================================================================
/// Results of a session, oldest first. Nothing is ever evicted.
#[derive(Debug, Clone, Default)]
pub struct ResearchHistory {
    results: Vec<ResearchResult>,
}

impl ResearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ResearchResult) {
        self.results.push(result);
    }

    /// The most recent result, shown expanded by the shell.
    pub fn latest(&self) -> Option<&ResearchResult> {
        self.results.last()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ResearchResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
