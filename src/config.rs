//! # Configuration Module
//!
//! Settings for the command-line shell, loaded from environment variables
//! (and a `.env` file during local development). The adapter library never
//! reads these itself; the shell turns them into a [`ResearchConfig`] per
//! query and a [`ProviderRegistry`] pointed at the configured endpoints.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::providers::{gemini, openai, GeminiAdapter, OpenAiAdapter, ProviderRegistry};
use crate::types::{
    Provider, ResearchConfig, DEFAULT_MAX_BRANCHES, DEFAULT_MAX_DEPTH, DEFAULT_TEMPERATURE,
};

/// Inclusive bounds for `max_depth` / `max_branches`.
const RESEARCH_LIMITS: std::ops::RangeInclusive<u8> = 1..=5;

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for the research shell.
///
/// API keys are kept out of `Debug` output.
#[derive(Clone)]
pub struct Config {
    /// Which provider answers queries
    pub provider: Provider,

    /// Model id; `None` uses the provider default
    pub model: Option<String>,

    /// Sampling temperature, 0.0 to 1.0
    pub temperature: f64,

    /// Research depth (accepted, not used by any research step yet)
    pub max_depth: u8,

    /// Research breadth (accepted, not used by any research step yet)
    pub max_branches: u8,

    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,

    /// OpenAI-compatible base URL (default: https://api.openai.com/v1)
    pub openai_base_url: String,

    /// Gemini base URL (default: https://generativelanguage.googleapis.com/v1beta)
    pub gemini_base_url: String,

    /// Log filter for the application
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_depth: DEFAULT_MAX_DEPTH,
            max_branches: DEFAULT_MAX_BRANCHES,
            openai_api_key: None,
            gemini_api_key: None,
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            gemini_base_url: gemini::DEFAULT_BASE_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_depth", &self.max_depth)
            .field("max_branches", &self.max_branches)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("log_level", &self.log_level)
            .finish()
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Example
    /// ```ignore
    /// let config = Config::from_env()?;
    /// println!("Using provider: {}", config.provider);
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (silently ignore if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value source.
    ///
    /// # Rust Concept: Closures as Parameters
    ///
    /// Taking `impl Fn(&str) -> Option<String>` instead of reading
    /// `std::env` directly lets tests feed a plain map in.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        // Empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(val) = var("RESEARCH_PROVIDER") {
            config.provider = val
                .parse::<Provider>()
                .map_err(anyhow::Error::msg)
                .context("RESEARCH_PROVIDER must be 'openai' or 'gemini'")?;
        }

        if let Some(val) = var("RESEARCH_MODEL") {
            config.model = Some(val);
        }

        if let Some(val) = var("TEMPERATURE") {
            config.temperature = val
                .trim()
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        if let Some(val) = var("MAX_DEPTH") {
            config.max_depth = val
                .trim()
                .parse()
                .context("MAX_DEPTH must be an integer between 1 and 5")?;
        }

        if let Some(val) = var("MAX_BRANCHES") {
            config.max_branches = val
                .trim()
                .parse()
                .context("MAX_BRANCHES must be an integer between 1 and 5")?;
        }

        config.openai_api_key = var("OPENAI_API_KEY");
        config.gemini_api_key = var("GEMINI_API_KEY");

        if let Some(val) = var("OPENAI_API_BASE_URL") {
            config.openai_base_url = val;
        }

        if let Some(val) = var("GEMINI_API_BASE_URL") {
            config.gemini_base_url = val;
        }

        if let Some(val) = var("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Validate the configuration before any query is sent.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 1.0, got: {}",
                self.temperature
            );
        }

        if !RESEARCH_LIMITS.contains(&self.max_depth) {
            anyhow::bail!("MAX_DEPTH must be between 1 and 5, got: {}", self.max_depth);
        }

        if !RESEARCH_LIMITS.contains(&self.max_branches) {
            anyhow::bail!(
                "MAX_BRANCHES must be between 1 and 5, got: {}",
                self.max_branches
            );
        }

        if self.api_key().is_none() {
            anyhow::bail!(
                "{} is not set (required for provider '{}')",
                Self::api_key_var(self.provider),
                self.provider
            );
        }

        Ok(())
    }

    /// Environment variable holding the key for `provider`.
    pub fn api_key_var(provider: Provider) -> &'static str {
        match provider {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// API key for the selected provider.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    /// Build the request for one query from the current settings.
    pub fn research_config(&self, query: &str) -> Result<ResearchConfig> {
        let api_key = self.api_key().with_context(|| {
            format!("{} is not set", Self::api_key_var(self.provider))
        })?;

        let mut request = ResearchConfig::new(self.provider, api_key, query)
            .with_temperature(self.temperature)
            .with_max_depth(self.max_depth)
            .with_max_branches(self.max_branches);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        Ok(request)
    }

    /// Adapters for both providers at the configured base URLs.
    pub fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::new()
            .with_adapter(
                Provider::OpenAi,
                Arc::new(OpenAiAdapter::with_base_url(&self.openai_base_url)),
            )
            .with_adapter(
                Provider::Gemini,
                Arc::new(GeminiAdapter::with_base_url(&self.gemini_base_url)),
            )
    }
}
