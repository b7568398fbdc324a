//! Question-to-SQL generation.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::llm::prompt::build_prompt;
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// Turns a natural-language question into SQL text.
///
/// The returned text is not validated; callers execute it as-is.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Generates SQL for `question` given a schema descriptor (possibly empty).
    async fn generate(&self, question: &str, schema: &str) -> Result<String>;
}

/// Generator backed by a completion client: one call, no retry.
pub struct LlmSqlGenerator {
    client: Box<dyn LlmClient>,
}

impl LlmSqlGenerator {
    /// Wraps a completion client.
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SqlGenerator for LlmSqlGenerator {
    async fn generate(&self, question: &str, schema: &str) -> Result<String> {
        let prompt = build_prompt(question, schema);
        debug!("Prompt:\n{}", prompt);

        let messages = [Message::user(prompt)];
        let response = self.client.complete(&messages).await?;

        Ok(response.trim().to_string())
    }
}
