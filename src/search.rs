use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, RouterError};
use crate::models::SearchResult;

pub const SERPAPI_URL: &str = "https://serpapi.com";

#[cfg(test)]
use mockall::automock;

/// Web search seam used by the realtime responder
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>>;
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SearchResult>,
    error: Option<String>,
}

pub struct SerpApiSearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiSearch {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>> {
        tracing::info!("Searching Google via SerpApi for: {}", query);
        let num = num_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
                ("engine", "google"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: SerpApiResponse = response.json().await.map_err(|e| {
            RouterError::Search(format!("Failed to parse SerpApi response ({status}): {e}"))
        })?;
        if let Some(err) = body.error {
            return Err(RouterError::Search(err));
        }

        let mut results = body.organic_results;
        results.truncate(num_results);
        Ok(results)
    }
}

/// Render hits as the bounded context block handed to the model
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    let mut answer = format!("The Search result for '{query}' are:\n[start]\n");
    for result in results {
        answer.push_str(&format!(
            "Title: {}\nDescription: {}\n\n",
            result.title, result.snippet
        ));
    }
    answer.push_str("[end]");
    answer
}

/// Inline replacement used when the search call itself fails
pub fn format_failure(err: &RouterError) -> String {
    format!("An error occurred while processing search results: {err}")
}
