use serde::Deserialize;
use serde_json::{Value, json};

use super::{ProviderError, social_post_id};
use crate::config::SearchConfig;
use crate::research::types::{ResultItem, SourceType};

const SOCIAL_DOMAINS: [&str; 2] = ["x.com", "twitter.com"];
const MAX_TEXT_CHARACTERS: usize = 2000;

/// Exa 搜索客户端，负责学术论文与社交帖子两类来源
#[derive(Clone)]
pub struct ExaClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

impl ExaClient {
    pub fn new(http: reqwest::Client, config: &SearchConfig) -> Self {
        Self {
            http,
            api_key: config.exa_api_key.clone(),
            base_url: config.exa_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search_papers(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        let body = json!({
            "query": query,
            "type": "auto",
            "numResults": max_results,
            "category": "research paper",
            "contents": { "text": { "maxCharacters": MAX_TEXT_CHARACTERS } },
        });
        let payload = self.post_search(SourceType::Academic, body).await?;
        Ok(map_papers(payload))
    }

    pub async fn search_posts(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        let body = json!({
            "query": query,
            "type": "auto",
            "numResults": max_results,
            "includeDomains": SOCIAL_DOMAINS,
            "contents": { "text": { "maxCharacters": MAX_TEXT_CHARACTERS } },
        });
        let payload = self.post_search(SourceType::Social, body).await?;
        Ok(map_posts(payload))
    }

    async fn post_search(
        &self,
        source_type: SourceType,
        body: Value,
    ) -> Result<ExaResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::new(
                source_type,
                "Exa API key is not configured",
            ));
        }

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(source_type, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::new(
                source_type,
                format!("status {}: {}", status, text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::new(source_type, format!("invalid response: {}", e)))
    }
}

fn content_of(result: &ExaResult) -> String {
    result
        .text
        .as_deref()
        .or(result.summary.as_deref())
        .unwrap_or_default()
        .to_string()
}

fn map_papers(payload: ExaResponse) -> Vec<ResultItem> {
    payload
        .results
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .map(|r| ResultItem {
            source: SourceType::Academic,
            content: content_of(&r),
            title: r.title.unwrap_or_else(|| "Untitled paper".to_string()),
            url: r.url,
            tweet_id: None,
        })
        .collect()
}

/// 帖子id能解析时就地填充；解析不了的由执行引擎统一丢弃
fn map_posts(payload: ExaResponse) -> Vec<ResultItem> {
    payload
        .results
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .map(|r| ResultItem {
            source: SourceType::Social,
            content: content_of(&r),
            tweet_id: social_post_id(&r.url),
            title: r
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Post".to_string()),
            url: r.url,
        })
        .collect()
}
