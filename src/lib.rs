//! # AI Research Assistant
//!
//! One request/response contract over two structurally different LLM APIs.
//!
//! A [`ResearchConfig`] names the provider, the caller's API key and the
//! question. [`perform_research`] sends it to the matching adapter and
//! returns a [`ResearchResult`] with the answer, follow-up questions and a
//! confidence score, or a typed [`ResearchError`].
//!
//! ```rust,ignore
//! use ai_research_assistant::{perform_research, Provider, ResearchConfig};
//!
//! let config = ResearchConfig::new(Provider::OpenAi, api_key, "How do CRDTs converge?");
//! let result = perform_research(&config).await?;
//! println!("{} ({:.0}%)", result.answer, result.confidence * 100.0);
//! ```
//!
//! The library reads no environment variables and stores nothing; the
//! command-line shell in `main.rs` owns configuration and history.

pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod schema;
pub mod types;

use std::sync::OnceLock;

pub use config::Config;
pub use error::ResearchError;
pub use providers::{GeminiAdapter, OpenAiAdapter, ProviderAdapter, ProviderRegistry};
pub use schema::ResearchPayload;
pub use types::{Provider, ResearchConfig, ResearchHistory, ResearchResult};

/// Run one research request against the provider's public endpoint.
///
/// Fails without a network call when `api_key` or `query` is empty. Every
/// other failure (transport, credentials, unusable model output) comes back
/// as the matching [`ResearchError`] variant; nothing is retried.
pub async fn perform_research(config: &ResearchConfig) -> Result<ResearchResult, ResearchError> {
    static REGISTRY: OnceLock<ProviderRegistry> = OnceLock::new();
    REGISTRY
        .get_or_init(ProviderRegistry::with_defaults)
        .perform_research(config)
        .await
}
