use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use crate::error::{Result, RouterError};
use crate::models::GroqRequest;
use crate::retry::RateLimitRetry;
use crate::transcript::TranscriptStore;
use crate::transport::Transport;

/// Transport that replays a fixed script of outcomes and records requests
pub(crate) struct ScriptedTransport {
    script: Mutex<Vec<Result<String>>>,
    pub(crate) requests: Mutex<Vec<GroqRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(mut script: Vec<Result<String>>) -> Arc<Self> {
        script.reverse();
        Arc::new(Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> GroqRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn chat(&self, req: &GroqRequest) -> Result<String> {
        self.requests.lock().unwrap().push(req.clone());
        self.script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(RouterError::Config("script exhausted".into())))
    }
}

pub(crate) fn rate_limited() -> Result<String> {
    Err(RouterError::RateLimited {
        body: "Rate limit reached for model".into(),
    })
}

pub(crate) fn fast_retry() -> RateLimitRetry {
    RateLimitRetry::new(3, Duration::from_millis(1))
}

pub(crate) fn temp_store() -> (TempDir, Arc<TranscriptStore>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(TranscriptStore::new(dir.path().join("ChatLog.json")));
    (dir, store)
}
