pub mod api;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod intent;
pub mod models;
pub mod prompts;
pub mod responders;
pub mod retry;
pub mod search;
pub mod transcript;
pub mod transport;

use std::sync::Arc;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::intent::{GroqIntent, IntentClassifier};
use crate::models::QueryResponse;
use crate::responders::{ConversationalResponder, Generation, RealtimeResponder, Responder};
use crate::retry::RateLimitRetry;
use crate::search::{SearchProvider, SerpApiSearch};
use crate::transcript::TranscriptStore;
use crate::transport::{GroqTransport, Transport};

/// Fully wired classify → dispatch → respond pipeline
pub struct RouterService {
    dispatcher: Arc<Dispatcher>,
    transcript: Arc<TranscriptStore>,
}

impl RouterService {
    pub fn new(cfg: &Config) -> Result<Self> {
        let transport = Arc::new(GroqTransport::new(
            cfg.groq.api_key.clone(),
            cfg.groq.base_url.clone(),
        )?);
        let search: Arc<dyn SearchProvider> = Arc::new(SerpApiSearch::new(
            cfg.search.api_key.clone(),
            cfg.search.base_url.clone(),
        ));
        Ok(Self::with_collaborators(
            cfg,
            transport as Arc<dyn Transport>,
            search,
        ))
    }

    /// Build the pipeline around caller-supplied completion and search clients
    pub fn with_collaborators(
        cfg: &Config,
        transport: Arc<dyn Transport>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        let transcript = Arc::new(TranscriptStore::new(&cfg.transcript.path));
        let retry = RateLimitRetry::from_config(&cfg.retry);

        let classifier: Arc<dyn IntentClassifier> = Arc::new(
            GroqIntent::new(
                Arc::clone(&transport),
                cfg.groq.intent_model.clone(),
                cfg.classifier.max_attempts,
            )
            .with_sampling(cfg.classifier.temperature, cfg.groq.intent_max_tokens),
        );

        let general: Arc<dyn Responder> = Arc::new(ConversationalResponder::new(
            Arc::clone(&transport),
            Arc::clone(&transcript),
            retry.clone(),
            &cfg.persona,
            Generation::chat(&cfg.groq),
        ));

        let realtime: Arc<dyn Responder> = Arc::new(RealtimeResponder::new(
            Arc::clone(&transport),
            search,
            Arc::clone(&transcript),
            retry,
            &cfg.persona,
            Generation::realtime(&cfg.groq),
            cfg.search.num_results,
        ));

        Self {
            dispatcher: Arc::new(Dispatcher::new(classifier, general, realtime)),
            transcript,
        }
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn transcript(&self) -> Arc<TranscriptStore> {
        Arc::clone(&self.transcript)
    }

    pub async fn handle(&self, query: &str) -> Result<QueryResponse> {
        self.dispatcher.handle(query).await
    }

    pub fn router(&self) -> axum::Router {
        api::create_router(api::AppState {
            dispatcher: self.dispatcher(),
        })
    }
}
