//! End-to-end tests for the HTTP surface with scripted collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use query_router::RouterService;
use query_router::config::Config;
use query_router::error::{Result, RouterError};
use query_router::models::{ChatMessage, GroqRequest, ResponseType, Role, SearchResult};
use query_router::prompts::DECISION_PREAMBLE;
use query_router::search::SearchProvider;
use query_router::transport::Transport;

// =============================================================================
// Helpers
// =============================================================================

/// Classifies anything mentioning "news" as realtime, everything else as
/// general, and answers with a fixed multi-line reply.
#[derive(Default)]
struct FakeGroq {
    classifications: AtomicUsize,
    completions: Mutex<Vec<GroqRequest>>,
}

#[async_trait]
impl Transport for FakeGroq {
    async fn chat(&self, req: &GroqRequest) -> Result<String> {
        let last = req.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        if req.messages.first().map(|m| m.content.as_str()) == Some(DECISION_PREAMBLE) {
            self.classifications.fetch_add(1, Ordering::SeqCst);
            let query = last.trim_start_matches("Query: ");
            if query.contains("news") {
                return Ok(format!("realtime {query}"));
            }
            if query.contains("email") {
                return Ok(format!("content {query}"));
            }
            return Ok(format!("general {query}"));
        }
        self.completions.lock().unwrap().push(req.clone());
        Ok(format!("Sure!\n\nYou said: {last}\n</s>"))
    }
}

#[derive(Default)]
struct FakeSearch {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok((0..num_results)
            .map(|i| SearchResult {
                title: format!("Result {i}"),
                snippet: format!("Snippet {i}"),
            })
            .collect())
    }
}

struct Harness {
    _dir: TempDir,
    service: RouterService,
    groq: Arc<FakeGroq>,
    search: Arc<FakeSearch>,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let mut cfg = Config::default();
    cfg.transcript.path = dir.path().join("ChatLog.json").to_string_lossy().into_owned();
    cfg.retry.rate_limit_backoff_secs = 0;

    let groq = Arc::new(FakeGroq::default());
    let search = Arc::new(FakeSearch::default());
    let service = RouterService::with_collaborators(&cfg, groq.clone(), search.clone());
    Harness {
        _dir: dir,
        service,
        groq,
        search,
    }
}

fn post_query(body: Value) -> Request<Body> {
    Request::post("/query/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let h = harness();
    let resp = h
        .service
        .router()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(json_body(resp).await["message"].as_str().unwrap().contains("running"));

    let resp = h
        .service
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_general_query_round_trip() {
    let h = harness();
    let resp = h
        .service
        .router()
        .oneshot(post_query(serde_json::json!({"query": "hi"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["type"], "general");
    let text = body["response"].as_str().unwrap();
    assert_eq!(text, "Sure!\nYou said: hi");
    assert!(text.split('\n').all(|l| !l.is_empty()));

    let transcript = h.service.transcript().snapshot().await.unwrap();
    let n = transcript.len();
    assert_eq!(transcript[n - 2], ChatMessage::user("hi"));
    assert_eq!(transcript[n - 1].role, Role::Assistant);
    assert!(h.search.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_realtime_query_performs_search() {
    let h = harness();
    let query = "what's the latest news on mars rover";
    let resp = h
        .service
        .router()
        .oneshot(post_query(serde_json::json!({ "query": query })))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["type"], "realtime");
    assert_eq!(*h.search.queries.lock().unwrap(), vec![query.to_string()]);

    let completions = h.groq.completions.lock().unwrap();
    let context = &completions[0].messages;
    assert!(context.iter().any(|m| m.content.contains("Title: Result 4")));
    assert!(!context.iter().any(|m| m.content.contains("Title: Result 5")));
}

#[tokio::test]
async fn test_shared_transcript_across_responders() {
    let h = harness();
    h.service.handle("hello there").await.unwrap();
    h.service.handle("any news today").await.unwrap();

    let transcript = h.service.transcript().snapshot().await.unwrap();
    let roles: Vec<Role> = transcript.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(transcript[2], ChatMessage::user("any news today"));
}

#[tokio::test]
async fn test_unsupported_query_type() {
    let h = harness();
    let resp = h
        .service
        .router()
        .oneshot(post_query(serde_json::json!({"query": "write an email to my landlord"})))
        .await
        .unwrap();
    let body = json_body(resp).await;
    assert_eq!(body["type"], "unsupported");
    assert_eq!(body["response"], "The query type 'content' is not supported yet.");
    assert!(h.groq.completions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_query_is_bad_request() {
    let h = harness();
    let resp = h
        .service
        .router()
        .oneshot(post_query(serde_json::json!({"query": "   "})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "Query cannot be empty.");
    assert_eq!(h.groq.classifications.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_upstream_failure_is_typed_error() {
    struct DownGroq;

    #[async_trait]
    impl Transport for DownGroq {
        async fn chat(&self, _req: &GroqRequest) -> Result<String> {
            Err(RouterError::Upstream {
                status: 503,
                body: "service unavailable".into(),
            })
        }
    }

    let dir = TempDir::new().unwrap();
    let mut cfg = Config::default();
    cfg.transcript.path = dir.path().join("ChatLog.json").to_string_lossy().into_owned();
    let service =
        RouterService::with_collaborators(&cfg, Arc::new(DownGroq), Arc::new(FakeSearch::default()));

    let resp = service
        .router()
        .oneshot(post_query(serde_json::json!({"query": "hi"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["type"], "error");
    assert!(body["response"].as_str().unwrap().starts_with("An error occurred: "));
}

#[tokio::test]
async fn test_unwritable_transcript_is_typed_error() {
    let h = harness();
    let path = h.service.transcript().path().to_path_buf();
    std::fs::write(&path, "[]").unwrap();
    std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

    let resp = h.service.handle("hi").await.unwrap();
    assert_eq!(resp.kind, ResponseType::Error);
    assert!(resp.response.starts_with("An error occurred: Transcript error"));
    assert_eq!(h.groq.completions.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_body_gets_error_body() {
    let h = harness();
    for body in ["not json", "{\"question\": \"hi\"}"] {
        let resp = h
            .service
            .router()
            .oneshot(
                Request::post("/query")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_body(resp).await;
        assert_eq!(json["error"], "bad_request");
        assert!(!json["message"].as_str().unwrap().is_empty());
    }
    assert_eq!(h.groq.classifications.load(Ordering::SeqCst), 0);
}

