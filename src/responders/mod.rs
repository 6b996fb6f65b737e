//! Response generators the dispatcher routes to
pub mod conversational;
pub mod realtime;

#[cfg(test)]
pub(crate) mod test_support;

use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;

use crate::config::GroqConfig;
use crate::error::Result;
use crate::models::{ChatMessage, GroqRequest};
use crate::prompts::realtime_information;
use crate::retry::{Attempted, RATE_LIMIT_APOLOGY, RateLimitRetry};
use crate::transcript::TranscriptStore;
use crate::transport::Transport;

pub use conversational::ConversationalResponder;
pub use realtime::RealtimeResponder;

/// Residual end-of-sequence token some models leak into the stream
pub const END_OF_SEQUENCE: &str = "</s>";

#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, query: &str) -> Result<String>;
}

/// Sampling parameters for one responder
#[derive(Debug, Clone)]
pub struct Generation {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: i32,
}

impl Generation {
    pub fn chat(cfg: &GroqConfig) -> Self {
        Self {
            model: cfg.chat_model.clone(),
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.chat_max_tokens,
        }
    }

    pub fn realtime(cfg: &GroqConfig) -> Self {
        Self {
            model: cfg.realtime_model.clone(),
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.realtime_max_tokens,
        }
    }
}

/// Drop blank lines so the returned answer never has empty interior lines
pub fn clean_answer(answer: &str) -> String {
    answer
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One transcript-backed completion turn, shared by both responders.
///
/// Holds the transcript lock from load to commit, retries rate limits, and on
/// a transcript failure resets the log and replays the turn exactly once.
pub(crate) struct TurnRunner {
    tx: Arc<dyn Transport>,
    store: Arc<TranscriptStore>,
    retry: RateLimitRetry,
}

impl TurnRunner {
    pub(crate) fn new(
        tx: Arc<dyn Transport>,
        store: Arc<TranscriptStore>,
        retry: RateLimitRetry,
    ) -> Self {
        Self { tx, store, retry }
    }

    /// `preamble` is the per-call system context placed before the date/time
    /// message and the transcript
    pub(crate) async fn run(
        &self,
        query: &str,
        preamble: &[ChatMessage],
        generation: &Generation,
        trim: bool,
    ) -> Result<String> {
        match self.attempt(query, preamble, generation, trim).await {
            Err(e) if e.is_transcript() => {
                tracing::warn!("Transcript unusable ({}), resetting and retrying the turn", e);
                if let Err(reset) = self.store.begin_turn().await.reset().await {
                    tracing::warn!("Transcript reset failed ({}), replaying anyway", reset);
                }
                self.attempt(query, preamble, generation, trim).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        query: &str,
        preamble: &[ChatMessage],
        generation: &Generation,
        trim: bool,
    ) -> Result<String> {
        let turn = self.store.begin_turn().await;
        let mut transcript = turn.load().await?;
        transcript.push(ChatMessage::user(query));

        let mut messages = Vec::with_capacity(preamble.len() + 1 + transcript.len());
        messages.extend_from_slice(preamble);
        messages.push(ChatMessage::system(realtime_information(&Local::now())));
        messages.extend(transcript.iter().cloned());

        let request = GroqRequest {
            model: generation.model.clone(),
            messages,
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            top_p: generation.top_p,
            stream: true,
        };

        let raw = match self.retry.run(|| self.tx.chat(&request)).await? {
            Attempted::Completed(raw) => raw,
            Attempted::Exhausted => return Ok(RATE_LIMIT_APOLOGY.to_string()),
        };

        let body = if trim { raw.trim() } else { raw.as_str() };
        let answer = body.replace(END_OF_SEQUENCE, "");
        transcript.push(ChatMessage::assistant(answer.clone()));
        turn.commit(&transcript).await?;

        Ok(clean_answer(&answer))
    }
}
