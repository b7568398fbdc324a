//! Mock LLM client for testing and offline demos.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned SQL based on the question text.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every call fails with this message.
    failure: Option<String>,
    /// Number of completed calls, shared across clones.
    calls: Arc<AtomicUsize>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose calls always fail, simulating an upstream outage.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Number of times `complete` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        // Only the question line drives the canned answers; the schema line
        // would otherwise match everything.
        let question = input_lower
            .lines()
            .find_map(|line| line.trim().strip_prefix("question:"))
            .unwrap_or(&input_lower);

        if question.contains("average salary") && question.contains("department") {
            return "SELECT department, AVG(salary) FROM employees GROUP BY department"
                .to_string();
        }

        if question.contains("how many") || question.contains("count") {
            return "SELECT COUNT(*) FROM employees".to_string();
        }

        if question.contains("highest") && question.contains("salary") {
            return "SELECT * FROM employees ORDER BY salary DESC LIMIT 1".to_string();
        }

        if question.contains("all employees") || question.contains("everyone") {
            return "SELECT * FROM employees".to_string();
        }

        "SELECT 'I do not know how to answer that' AS message".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(AppError::llm(message.clone()));
        }
        let input = Self::extract_user_input(messages);
        // Mimic models that pad their answer with whitespace.
        Ok(format!("\n{}\n", self.mock_response(&input)))
    }
}
