use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};

use crate::error::{Result, RouterError};
use crate::models::{GroqRequest, GroqStreamChunk};

pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// Completion service seam. Implementations stream the generation and hand
/// back the concatenated text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn chat(&self, req: &GroqRequest) -> Result<String>;
}

pub struct GroqTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqTransport {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for GroqTransport {
    async fn chat(&self, req: &GroqRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RouterError::RateLimited { body });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RouterError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let mut decoder = SseDecoder::default();
        let mut answer = String::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for fragment in decoder.push(&chunk)? {
                answer.push_str(&fragment);
            }
            if decoder.is_done() {
                break;
            }
        }
        for fragment in decoder.finish()? {
            answer.push_str(&fragment);
        }

        tracing::debug!(model = %req.model, chars = answer.len(), "Groq stream completed");
        Ok(answer)
    }
}

/// Incremental decoder for OpenAI-style `data:` event streams.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence, so
/// input is buffered until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Feed raw bytes, returning any content fragments completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(bytes);
        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(fragment) = self.decode_line(&line)? {
                fragments.push(fragment);
            }
        }
        Ok(fragments)
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Result<Vec<String>> {
        let rest = std::mem::take(&mut self.buffer);
        Ok(self.decode_line(&rest)?.into_iter().collect())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn decode_line(&mut self, raw: &[u8]) -> Result<Option<String>> {
        if self.done {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(None);
        };
        let data = data.trim();
        if data == "[DONE]" {
            self.done = true;
            return Ok(None);
        }
        if data.is_empty() {
            return Ok(None);
        }
        let chunk: GroqStreamChunk = serde_json::from_str(data)?;
        if let Some(error) = chunk.error {
            self.done = true;
            return Err(stream_error(error));
        }
        Ok(chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|c| !c.is_empty()))
    }
}

fn stream_error(error: serde_json::Value) -> RouterError {
    let body = error.to_string();
    let tagged_rate_limit = ["type", "code"].iter().any(|key| {
        error
            .get(key)
            .and_then(|v| v.as_str())
            .is_some_and(|v| v.contains("rate_limit"))
    });
    if tagged_rate_limit {
        RouterError::RateLimited { body }
    } else {
        RouterError::Upstream { status: 200, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_decoder_concatenates_fragments() {
        let mut decoder = SseDecoder::default();
        let mut out = String::new();
        let payload = format!("{}{}data: [DONE]\n\n", event("Hel"), event("lo"));
        for f in decoder.push(payload.as_bytes()).unwrap() {
            out.push_str(&f);
        }
        assert_eq!(out, "Hello");
        assert!(decoder.is_done());
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::default();
        let payload = event("split across reads");
        let (a, b) = payload.as_bytes().split_at(17);
        assert!(decoder.push(a).unwrap().is_empty());
        assert_eq!(decoder.push(b).unwrap(), vec!["split across reads".to_string()]);
    }

    #[test]
    fn test_decoder_skips_role_only_and_comment_lines() {
        let mut decoder = SseDecoder::default();
        let payload = concat!(
            ": keep-alive\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
            "data: {\"choices\":[]}\n"
        );
        assert!(decoder.push(payload.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_decoder_flushes_unterminated_tail() {
        let mut decoder = SseDecoder::default();
        let payload = event("tail");
        let unterminated = payload.trim_end();
        assert!(decoder.push(unterminated.as_bytes()).unwrap().is_empty());
        assert_eq!(decoder.finish().unwrap(), vec!["tail".to_string()]);
    }

    #[test]
    fn test_decoder_rejects_malformed_json() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {not json}\n").is_err());
    }

    #[test]
    fn test_decoder_surfaces_mid_stream_error_event() {
        let mut decoder = SseDecoder::default();
        let payload = format!(
            "{}data: {{\"error\":{{\"message\":\"Service Unavailable\"}}}}\n\n",
            event("Hel")
        );
        match decoder.push(payload.as_bytes()) {
            Err(RouterError::Upstream { status, body }) => {
                assert_eq!(status, 200);
                assert!(body.contains("Service Unavailable"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert!(decoder.is_done());
    }

    #[test]
    fn test_decoder_maps_rate_limit_error_event() {
        let mut decoder = SseDecoder::default();
        let payload = concat!(
            "data: {\"error\":{\"message\":\"Slow down\",",
            "\"type\":\"tokens\",\"code\":\"rate_limit_exceeded\"}}\n"
        );
        let err = decoder.push(payload.as_bytes()).unwrap_err();
        assert!(err.is_rate_limited());
    }
}
