//! Provider adapters
//!
//! Each adapter turns one vendor's calling convention into the shared
//! `ResearchConfig` → [`ResearchPayload`] contract. Dispatch goes through a
//! [`ProviderRegistry`], so supporting another vendor means registering one
//! more adapter rather than touching the call site.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   perform_research(&ResearchConfig)     │
//! └─────────────────┬───────────────────────┘
//!                   │ looks up config.provider
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │        ProviderRegistry                 │
//! │   Provider -> Arc<dyn ProviderAdapter>  │
//! └─────────────────┬───────────────────────┘
//!          ┌────────┴────────┐
//!          ▼                 ▼
//! ┌─────────────────┐ ┌─────────────────┐
//! │  OpenAiAdapter  │ │  GeminiAdapter  │
//! │ forced function │ │  JSON-only text │
//! └─────────────────┘ └─────────────────┘
//! ```

pub mod gemini;
pub mod openai;

pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ResearchError;
use crate::schema::ResearchPayload;
use crate::types::{Provider, ResearchConfig, ResearchResult};

/// One vendor's request/response translation.
///
/// Implementations issue exactly one API call per `run` and hold no
/// per-call state, so a single adapter can serve concurrent requests.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Issue the call and return the validated model output.
    async fn run(&self, request: &ResearchConfig) -> Result<ResearchPayload, ResearchError>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model used when the request does not name one
    fn default_model(&self) -> &str;
}

/// Maps each provider to the adapter that serves it.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Both built-in adapters, pointed at the public endpoints.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_adapter(Provider::OpenAi, Arc::new(OpenAiAdapter::new()))
            .with_adapter(Provider::Gemini, Arc::new(GeminiAdapter::new()))
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_adapter(mut self, provider: Provider, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(provider, adapter);
        self
    }

    /// Register an adapter, replacing any previous one for the provider.
    pub fn register(&mut self, provider: Provider, adapter: Arc<dyn ProviderAdapter>) {
        if self.adapters.insert(provider, adapter).is_some() {
            debug!(provider = %provider, "Replaced provider adapter");
        }
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider).cloned()
    }

    /// Registered providers, in a stable order.
    pub fn providers(&self) -> Vec<Provider> {
        let mut providers: Vec<Provider> = self.adapters.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }

    /// Run one research request through the adapter for `config.provider`.
    ///
    /// Only `api_key` and `query` are checked here; everything else is
    /// passed through to the adapter as given.
    pub async fn perform_research(
        &self,
        config: &ResearchConfig,
    ) -> Result<ResearchResult, ResearchError> {
        if config.api_key().trim().is_empty() {
            return Err(ResearchError::InvalidRequest(
                "an API key is required".to_string(),
            ));
        }
        if config.query().trim().is_empty() {
            return Err(ResearchError::InvalidRequest(
                "the research query must not be empty".to_string(),
            ));
        }

        let adapter = self.get(config.provider()).ok_or_else(|| {
            ResearchError::InvalidRequest(format!(
                "no adapter registered for provider '{}'",
                config.provider()
            ))
        })?;

        info!(
            provider = adapter.name(),
            model = config.model().unwrap_or(adapter.default_model()),
            "Starting research request"
        );
        let started = Instant::now();

        match adapter.run(config).await {
            Ok(payload) => {
                info!(
                    provider = adapter.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    follow_ups = payload.follow_up_questions.len(),
                    "Research request completed"
                );
                Ok(ResearchResult::from_payload(config.query(), payload))
            }
            Err(e) => {
                warn!(
                    provider = adapter.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Research request failed"
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

// =============================================================================
// SHARED HTTP HELPERS
// =============================================================================

/// Classify a failed `send()`. The URL is stripped since Gemini carries the
/// key in the query string.
pub(crate) fn send_error(provider: Provider, e: reqwest::Error) -> ResearchError {
    let e = e.without_url();
    let detail = error_chain(&e);
    let message = if e.is_timeout() {
        format!("request timed out: {}", detail)
    } else if e.is_connect() {
        format!("connection failed: {}", detail)
    } else {
        format!("request failed: {}", detail)
    };
    ResearchError::transport(provider, None, message)
}

/// Join an error with its `source()` chain, skipping repeated messages.
pub(crate) fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut last = message.clone();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text != last && !last.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        last = text;
        source = cause.source();
    }
    message
}

/// Read a response and turn a non-2xx status into an error.
///
/// Returns the body text on success.
pub(crate) async fn read_body(
    provider: Provider,
    response: reqwest::Response,
) -> Result<String, ResearchError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        ResearchError::transport(
            provider,
            Some(status.as_u16()),
            format!("failed to read response body: {}", error_chain(&e.without_url())),
        )
    })?;

    if status.is_success() {
        return Ok(body);
    }

    Err(ResearchError::from_status(
        provider,
        status.as_u16(),
        provider_error_message(&body, status),
    ))
}

/// Pull a human-readable message out of a vendor error body.
///
/// Both vendors nest it as `{"error": {"message": ...}}`; some proxies send
/// a flat `{"message": ...}`. Anything else is reported verbatim.
pub(crate) fn provider_error_message(body: &str, status: reqwest::StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let nested = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("message"))
            .and_then(Value::as_str)
    });

    match nested {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => format!("HTTP {}: {}", status, body.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    /// Mock adapter for testing dispatch
    struct EchoAdapter {
        label: &'static str,
    }

    #[async_trait]
    impl ProviderAdapter for EchoAdapter {
        async fn run(&self, request: &ResearchConfig) -> Result<ResearchPayload, ResearchError> {
            Ok(ResearchPayload {
                answer: format!("{}: {}", self.label, request.query()),
                follow_up_questions: vec![],
                confidence: 0.5,
                sources: None,
            })
        }

        fn name(&self) -> &str {
            self.label
        }

        fn default_model(&self) -> &str {
            "echo-1"
        }
    }

    struct FailingAdapter;

    #[async_trait]
    impl ProviderAdapter for FailingAdapter {
        async fn run(&self, _request: &ResearchConfig) -> Result<ResearchPayload, ResearchError> {
            Err(ResearchError::malformed(Provider::Gemini, "The model did not return valid JSON"))
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn default_model(&self) -> &str {
            "none"
        }
    }

    fn echo_registry() -> ProviderRegistry {
        ProviderRegistry::new()
            .with_adapter(Provider::OpenAi, Arc::new(EchoAdapter { label: "first" }))
            .with_adapter(Provider::Gemini, Arc::new(EchoAdapter { label: "second" }))
    }

    #[tokio::test]
    async fn test_dispatch_by_provider() {
        let registry = echo_registry();

        let config = ResearchConfig::new(Provider::Gemini, "key", "hello");
        let result = registry.perform_research(&config).await.unwrap();

        assert_eq!(result.answer, "second: hello");
        assert_eq!(result.query, "hello");
    }

    #[tokio::test]
    async fn test_register_replaces_adapter() {
        let mut registry = echo_registry();
        registry.register(Provider::OpenAi, Arc::new(EchoAdapter { label: "replacement" }));

        let config = ResearchConfig::new(Provider::OpenAi, "key", "hi");
        let result = registry.perform_research(&config).await.unwrap();

        assert_eq!(result.answer, "replacement: hi");
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_dispatch() {
        let registry = ProviderRegistry::new()
            .with_adapter(Provider::OpenAi, Arc::new(FailingAdapter));

        let config = ResearchConfig::new(Provider::OpenAi, "key", "   ");
        let err = registry.perform_research(&config).await.unwrap_err();

        assert!(matches!(err, ResearchError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_empty_api_key_rejected() {
        let registry = echo_registry();

        let config = ResearchConfig::new(Provider::OpenAi, "", "hello");
        let err = registry.perform_research(&config).await.unwrap_err();

        assert!(err.to_string().starts_with("API Error: "));
        assert!(err.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn test_unregistered_provider() {
        let registry = ProviderRegistry::new()
            .with_adapter(Provider::OpenAi, Arc::new(EchoAdapter { label: "only" }));

        let config = ResearchConfig::new(Provider::Gemini, "key", "hello");
        let err = registry.perform_research(&config).await.unwrap_err();

        assert!(err.to_string().contains("no adapter registered for provider 'gemini'"));
    }

    #[tokio::test]
    async fn test_adapter_error_propagates() {
        let registry = ProviderRegistry::new()
            .with_adapter(Provider::Gemini, Arc::new(FailingAdapter));

        let config = ResearchConfig::new(Provider::Gemini, "key", "hello");
        let err = registry.perform_research(&config).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "API Error: Gemini API Error: The model did not return valid JSON"
        );
    }

    #[test]
    fn test_default_registry_has_both_providers() {
        let registry = ProviderRegistry::with_defaults();

        assert_eq!(registry.providers(), vec![Provider::Gemini, Provider::OpenAi]);
        assert_eq!(registry.get(Provider::OpenAi).unwrap().name(), "openai");
        assert_eq!(registry.get(Provider::Gemini).unwrap().default_model(), "gemini-pro");
    }

    #[test]
    fn test_provider_error_message_nested() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            provider_error_message(body, StatusCode::UNAUTHORIZED),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn test_provider_error_message_flat() {
        let body = r#"{"message": "quota exceeded"}"#;
        assert_eq!(
            provider_error_message(body, StatusCode::TOO_MANY_REQUESTS),
            "quota exceeded"
        );
    }

    #[test]
    fn test_provider_error_message_raw_body() {
        assert_eq!(
            provider_error_message("upstream down", StatusCode::BAD_GATEWAY),
            "HTTP 502 Bad Gateway: upstream down"
        );
        assert_eq!(
            provider_error_message("", StatusCode::SERVICE_UNAVAILABLE),
            "HTTP 503 Service Unavailable"
        );
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct SendFailure(#[source] ConnectFailure);

    #[derive(Debug, thiserror::Error)]
    #[error("tcp connect error")]
    struct ConnectFailure(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let err = SendFailure(ConnectFailure(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        )));

        assert_eq!(
            error_chain(&err),
            "error sending request: tcp connect error: Connection refused"
        );
    }

    #[test]
    fn test_error_chain_without_source() {
        let err = std::io::Error::other("boom");
        assert_eq!(error_chain(&err), "boom");
    }
}
