use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use crate::error::{Result, RouterError};
use crate::intent::IntentClassifier;
use crate::models::{CommandKind, QueryResponse, ResponseType};
use crate::responders::Responder;

/// Routes a query to a responder based on the classifier's first command
pub struct Dispatcher {
    classifier: Arc<dyn IntentClassifier>,
    general: Arc<dyn Responder>,
    realtime: Arc<dyn Responder>,
}

impl Dispatcher {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        general: Arc<dyn Responder>,
        realtime: Arc<dyn Responder>,
    ) -> Self {
        Self {
            classifier,
            general,
            realtime,
        }
    }

    /// Always yields a typed response for a non-empty query; only the empty
    /// query is reported as an error
    pub async fn handle(&self, query: &str) -> Result<QueryResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RouterError::empty_query());
        }

        let span = tracing::info_span!("query", request_id = %Uuid::new_v4());
        let response = async move {
            let start = Instant::now();
            match self.route(query, start).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Error handling query: {}", e);
                    QueryResponse::new(ResponseType::Error, format!("An error occurred: {e}"))
                }
            }
        }
        .instrument(span)
        .await;
        Ok(response)
    }

    async fn route(&self, query: &str, start: Instant) -> Result<QueryResponse> {
        let decision = self.classifier.classify(query).await?;
        tracing::info!(
            "Decision: {:?} | Time: {:.2}s",
            decision.iter().map(|c| c.as_str()).collect::<Vec<_>>(),
            start.elapsed().as_secs_f64()
        );

        let Some(first) = decision.first().filter(|c| c.kind() != CommandKind::Unknown) else {
            return Ok(QueryResponse::new(
                ResponseType::Unknown,
                "Couldn't determine the query type.",
            ));
        };

        let (task_type, refined_query) = first.split();
        let (kind, responder) = match task_type.as_str() {
            "general" => (ResponseType::General, &self.general),
            "realtime" => (ResponseType::Realtime, &self.realtime),
            _ => {
                return Ok(QueryResponse::new(
                    ResponseType::Unsupported,
                    format!("The query type '{task_type}' is not supported yet."),
                ));
            }
        };

        let response = responder.respond(refined_query).await?;
        tracing::info!(
            "Handled {} query in {:.2}s",
            kind.as_str(),
            start.elapsed().as_secs_f64()
        );
        Ok(QueryResponse::new(kind, response))
    }
}
