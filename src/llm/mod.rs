//! LLM integration for hr-ask.
//!
//! Provides the completion client trait, an OpenAI-compatible implementation
//! (Groq by default), a deterministic mock, and the question-to-SQL generator
//! built on top of them.

pub mod factory;
pub mod generator;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod types;

pub use factory::create_client;
pub use generator::{LlmSqlGenerator, SqlGenerator};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use prompt::build_prompt;
pub use types::{Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to be shared by handlers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Returns the content of the first choice, untouched.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Groq's OpenAI-compatible endpoint.
    #[default]
    Groq,
    /// OpenAI.
    OpenAi,
    /// Mock client for demos and testing (no API key required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }

    /// Default model for the provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Groq => "llama3-8b-8192",
            Self::OpenAi => "gpt-4o-mini",
            Self::Mock => "mock",
        }
    }

    /// Default API base URL for the provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Mock => "http://localhost",
        }
    }

    /// Default environment variable carrying the API key.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Mock => "MOCK_API_KEY",
        }
    }

    /// Whether the provider needs a credential.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
