//! 搜索服务门面 - 统一网页、学术、社交三类搜索后端

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use crate::config::SearchConfig;
use crate::research::types::{ResearchDepth, ResultItem, SourceType};

mod exa;
mod tavily;

pub use exa::ExaClient;
pub use tavily::TavilyClient;

/// 单次搜索调用失败
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{source_type} search failed: {cause}")]
pub struct ProviderError {
    pub source_type: SourceType,
    pub cause: String,
}

impl ProviderError {
    pub fn new(source_type: SourceType, cause: impl Into<String>) -> Self {
        Self {
            source_type,
            cause: cause.into(),
        }
    }
}

/// 搜索门面，所有厂商返回都在适配器内映射为 [`ResultItem`]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_web(
        &self,
        query: &str,
        depth: ResearchDepth,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError>;

    async fn search_academic(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError>;

    async fn search_social(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError>;
}

static SOCIAL_STATUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|mobile\.)?(?:x|twitter)\.com/(?:#!/)?\w+/status(?:es)?/(\d+)")
        .expect("social status pattern is valid")
});

/// 从帖子链接中解析平台原生id
pub fn social_post_id(url: &str) -> Option<String> {
    SOCIAL_STATUS_URL
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 基于 Tavily（网页）与 Exa（学术、社交）的默认门面
#[derive(Clone)]
pub struct SearchFacade {
    tavily: TavilyClient,
    exa: ExaClient,
}

impl SearchFacade {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("deepresearch-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            tavily: TavilyClient::new(http.clone(), config),
            exa: ExaClient::new(http, config),
        })
    }
}

#[async_trait]
impl SearchProvider for SearchFacade {
    async fn search_web(
        &self,
        query: &str,
        depth: ResearchDepth,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        self.tavily.search(query, depth, max_results).await
    }

    async fn search_academic(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        self.exa.search_papers(query, max_results).await
    }

    async fn search_social(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultItem>, ProviderError> {
        self.exa.search_posts(query, max_results).await
    }
}
