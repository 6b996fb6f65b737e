use async_trait::async_trait;
use std::sync::Arc;

use super::{Generation, Responder, TurnRunner};
use crate::config::PersonaConfig;
use crate::error::Result;
use crate::models::ChatMessage;
use crate::prompts::realtime_persona;
use crate::retry::RateLimitRetry;
use crate::search::{SearchProvider, format_failure, format_results};
use crate::transcript::TranscriptStore;
use crate::transport::Transport;

/// Grounds the completion in fresh web search results
pub struct RealtimeResponder {
    runner: TurnRunner,
    search: Arc<dyn SearchProvider>,
    persona: Vec<ChatMessage>,
    generation: Generation,
    num_results: usize,
}

impl RealtimeResponder {
    pub fn new(
        tx: Arc<dyn Transport>,
        search: Arc<dyn SearchProvider>,
        store: Arc<TranscriptStore>,
        retry: RateLimitRetry,
        persona: &PersonaConfig,
        generation: Generation,
        num_results: usize,
    ) -> Self {
        Self {
            runner: TurnRunner::new(tx, store, retry),
            search,
            persona: realtime_persona(persona),
            generation,
            num_results,
        }
    }

    pub fn persona(&self) -> &[ChatMessage] {
        &self.persona
    }

    async fn search_context(&self, query: &str) -> ChatMessage {
        let content = match self.search.search(query, self.num_results).await {
            Ok(results) => {
                tracing::info!("Search returned {} results for: {}", results.len(), query);
                format_results(query, &results)
            }
            Err(e) => {
                tracing::warn!("Search failed for '{}', continuing without results: {}", query, e);
                format_failure(&e)
            }
        };
        ChatMessage::system(content)
    }
}

#[async_trait]
impl Responder for RealtimeResponder {
    async fn respond(&self, query: &str) -> Result<String> {
        tracing::info!("Answering realtime query: {}", query);
        let mut preamble = self.persona.clone();
        preamble.push(self.search_context(query).await);

        self.runner
            .run(query, &preamble, &self.generation, true)
            .await
    }
}
