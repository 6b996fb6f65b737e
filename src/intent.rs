use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ChatMessage, Command, GroqRequest};
use crate::prompts::{DECISION_PREAMBLE, few_shot_history};
use crate::transport::Transport;

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> Result<Vec<Command>>;
}

/// LLM-backed decision model: one constrained generation per attempt,
/// filtered down to recognized commands
pub struct GroqIntent {
    tx: Arc<dyn Transport>,
    model: String,
    temperature: f32,
    max_tokens: i32,
    max_attempts: u32,
}

impl GroqIntent {
    pub fn new(tx: Arc<dyn Transport>, model: String, max_attempts: u32) -> Self {
        Self {
            tx,
            model,
            temperature: 0.7,
            max_tokens: 256,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: i32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, query: &str) -> GroqRequest {
        let mut messages = Vec::with_capacity(2 + 2 * crate::prompts::CHAT_HISTORY_EXAMPLES.len());
        messages.push(ChatMessage::system(DECISION_PREAMBLE));
        messages.extend(few_shot_history());
        messages.push(ChatMessage::user(format!("Query: {query}")));

        GroqRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: 1.0,
            stream: true,
        }
    }
}

/// Split a raw generation into recognized commands, preserving order
pub fn parse_commands(raw: &str) -> Vec<Command> {
    raw.replace('\n', "")
        .split(',')
        .map(str::trim)
        .filter_map(|candidate| {
            let command = Command::recognize(candidate);
            if command.is_none() && !candidate.is_empty() {
                tracing::debug!("Discarding unrecognized candidate: {}", candidate);
            }
            command
        })
        .collect()
}

#[async_trait]
impl IntentClassifier for GroqIntent {
    async fn classify(&self, query: &str) -> Result<Vec<Command>> {
        tracing::info!("Classifying query intent with Groq for query: {}", query);
        let request = self.build_request(query);

        for attempt in 1..=self.max_attempts {
            let raw = self.tx.chat(&request).await?;
            let commands = parse_commands(&raw);

            if commands.iter().any(Command::is_ambiguous) {
                tracing::warn!(
                    "Classifier echoed the (query) template on attempt {}/{}: {}",
                    attempt,
                    self.max_attempts,
                    raw.trim()
                );
                continue;
            }
            return Ok(commands);
        }

        tracing::warn!(
            "Classifier stayed ambiguous after {} attempts, falling back to unknown",
            self.max_attempts
        );
        Ok(vec![Command::unknown()])
    }
}
