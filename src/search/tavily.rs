use serde::Deserialize;
use serde_json::json;

use super::ProviderError;
use crate::config::SearchConfig;
use crate::research::types::{ResearchDepth, ResultItem, SourceType};

/// Tavily 网页搜索客户端
#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    exclude_domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: Option<String>,
}

impl TavilyClient {
    pub fn new(http: reqwest::Client, config: &SearchConfig) -> Self {
        Self {
            http,
            api_key: config.tavily_api_key.clone(),
            base_url: config.tavily_base_url.trim_end_matches('/').to_string(),
            exclude_domains: config.exclude_domains.clone(),
        }
    }

    pub async fn search(
        &self,
        query: &str,
        depth: ResearchDepth,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::new(
                SourceType::Web,
                "Tavily API key is not configured",
            ));
        }

        let mut body = json!({
            "query": query,
            "search_depth": depth.as_str(),
            "max_results": max_results,
            "include_answer": false,
            "include_raw_content": false,
        });
        if !self.exclude_domains.is_empty() {
            body["exclude_domains"] = json!(self.exclude_domains);
        }

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(SourceType::Web, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                SourceType::Web,
                format!("status {}: {}", status, text),
            ));
        }

        let payload: TavilyResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(SourceType::Web, format!("invalid response: {}", e)))?;

        Ok(map_results(payload))
    }
}

fn map_results(payload: TavilyResponse) -> Vec<ResultItem> {
    payload
        .results
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .map(|r| ResultItem {
            source: SourceType::Web,
            title: r
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| r.url.clone()),
            url: r.url.trim().to_string(),
            content: r.content.unwrap_or_default(),
            tweet_id: None,
        })
        .collect()
}
