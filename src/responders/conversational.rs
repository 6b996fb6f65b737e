use async_trait::async_trait;
use std::sync::Arc;

use super::{Generation, Responder, TurnRunner};
use crate::config::PersonaConfig;
use crate::error::Result;
use crate::models::ChatMessage;
use crate::prompts::chat_persona;
use crate::retry::RateLimitRetry;
use crate::transcript::TranscriptStore;
use crate::transport::Transport;

/// Answers from model knowledge plus the current date and time
pub struct ConversationalResponder {
    runner: TurnRunner,
    persona: Vec<ChatMessage>,
    generation: Generation,
}

impl ConversationalResponder {
    pub fn new(
        tx: Arc<dyn Transport>,
        store: Arc<TranscriptStore>,
        retry: RateLimitRetry,
        persona: &PersonaConfig,
        generation: Generation,
    ) -> Self {
        Self {
            runner: TurnRunner::new(tx, store, retry),
            persona: chat_persona(persona),
            generation,
        }
    }
}

#[async_trait]
impl Responder for ConversationalResponder {
    async fn respond(&self, query: &str) -> Result<String> {
        tracing::info!("Answering general query: {}", query);
        self.runner
            .run(query, &self.persona, &self.generation, false)
            .await
    }
}
