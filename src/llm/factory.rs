//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating completion clients.

use tracing::info;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Creates a completion client from the LLM configuration.
///
/// Real providers need an API key in the environment variable named by
/// `llm.api_key_env` (provider default otherwise); a missing key is a
/// configuration error.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let provider = config.provider()?;

    match provider {
        LlmProvider::Groq | LlmProvider::OpenAi => {
            let key = config.api_key()?;
            let client_config = OpenAiConfig::new(key, config.model(), config.base_url()?)
                .with_timeout(config.timeout_secs);
            info!(
                "Using {} completion API at {} (model {})",
                provider,
                client_config.base_url,
                client_config.model
            );
            Ok(Box::new(OpenAiClient::new(client_config)?))
        }
        LlmProvider::Mock => {
            info!("Using mock completion client");
            Ok(Box::new(MockLlmClient::new()))
        }
    }
}
