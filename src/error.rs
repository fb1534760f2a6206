//! # Error Module
//!
//! Typed failures of the provider adapter.
//!
//! Every variant renders with the `"API Error: "` prefix, and failures on
//! the Gemini path carry an inner `"Gemini API Error: "` prefix, so a caller
//! that only shows the message still sees the familiar strings. Callers that
//! want to react differently to credentials, transport and model-output
//! problems match on the variant instead.

use thiserror::Error;

use crate::types::Provider;

/// Failure of a single research call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResearchError {
    /// The request was rejected before any network call was made.
    #[error("API Error: {0}")]
    InvalidRequest(String),

    /// The provider could not be reached, or answered with a non-auth HTTP error.
    #[error("API Error: {}", scoped(.provider, .message))]
    Transport {
        provider: Provider,
        status: Option<u16>,
        message: String,
    },

    /// The provider rejected the API key.
    #[error("API Error: {}", scoped(.provider, .message))]
    Auth { provider: Provider, message: String },

    /// The provider answered, but not with a decodable research object.
    #[error("API Error: {}", scoped(.provider, .message))]
    MalformedResponse { provider: Provider, message: String },

    /// The decoded object is missing a field or has the wrong type.
    #[error("API Error: {}", scoped(.provider, .message))]
    SchemaViolation { provider: Provider, message: String },
}

fn scoped(provider: &Provider, message: &str) -> String {
    match provider {
        Provider::Gemini => format!("Gemini API Error: {}", message),
        Provider::OpenAi => message.to_string(),
    }
}

impl ResearchError {
    pub fn transport(provider: Provider, status: Option<u16>, message: impl Into<String>) -> Self {
        ResearchError::Transport {
            provider,
            status,
            message: message.into(),
        }
    }

    pub fn auth(provider: Provider, message: impl Into<String>) -> Self {
        ResearchError::Auth {
            provider,
            message: message.into(),
        }
    }

    pub fn malformed(provider: Provider, message: impl Into<String>) -> Self {
        ResearchError::MalformedResponse {
            provider,
            message: message.into(),
        }
    }

    pub fn schema(provider: Provider, message: impl Into<String>) -> Self {
        ResearchError::SchemaViolation {
            provider,
            message: message.into(),
        }
    }

    /// Map a failed HTTP status and the provider's message to an error kind.
    pub fn from_status(provider: Provider, status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::auth(provider, message),
            _ => Self::transport(provider, Some(status), message),
        }
    }

    /// The provider involved, if the request got that far.
    pub fn provider(&self) -> Option<Provider> {
        match self {
            ResearchError::InvalidRequest(_) => None,
            ResearchError::Transport { provider, .. }
            | ResearchError::Auth { provider, .. }
            | ResearchError::MalformedResponse { provider, .. }
            | ResearchError::SchemaViolation { provider, .. } => Some(*provider),
        }
    }

    /// Whether issuing the same request again could succeed.
    ///
    /// Nothing in this crate retries; the flag is for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResearchError::Transport { status, .. } => {
                matches!(status, None | Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }
}
