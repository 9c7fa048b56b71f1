use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::research::error::ResearchError;
use crate::research::events::{EventKind, ProgressEvent, ProgressSink};
use crate::research::prompts::LedgerFormatter;
use crate::research::types::ResearchDepth;
use crate::search::SearchProvider;

/// 编排器运行参数
#[derive(Debug, Clone)]
pub struct ResearchSettings {
    /// 网页与学术搜索每步最少返回条数
    pub min_results_per_step: usize,
    /// 每步最多返回条数
    pub max_results_per_step: usize,
    /// 单次搜索调用的超时
    pub provider_timeout: Duration,
    /// 写入prompt时单条结果内容的截断长度
    pub content_truncate_length: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            min_results_per_step: 1,
            max_results_per_step: 10,
            provider_timeout: Duration::from_secs(30),
            content_truncate_length: 1500,
        }
    }
}

impl From<&Config> for ResearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            min_results_per_step: config.research.min_results_per_step,
            max_results_per_step: config.research.max_results_per_step,
            provider_timeout: Duration::from_secs(config.search.timeout_seconds),
            content_truncate_length: config.research.content_truncate_length,
        }
    }
}

/// 单次研究调用的上下文，调用返回后即丢弃
pub struct ResearchContext<'a, G> {
    pub generator: &'a G,
    pub search: &'a dyn SearchProvider,
    pub sink: &'a dyn ProgressSink,
    pub cancel: &'a CancellationToken,
    pub settings: &'a ResearchSettings,
    pub formatter: LedgerFormatter,
    pub topic: &'a str,
    pub depth: ResearchDepth,
}

impl<'a, G> ResearchContext<'a, G> {
    pub fn emit(&self, event: ProgressEvent) {
        self.sink.emit(event);
    }

    /// 已取消时立即返回 [`ResearchError::Cancelled`]
    pub fn ensure_active(&self) -> Result<(), ResearchError> {
        if self.cancel.is_cancelled() {
            Err(ResearchError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// 在取消令牌的约束下等待一个挂起点
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, ResearchError>
    where
        F: Future<Output = Result<T, ResearchError>>,
    {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResearchError::Cancelled),
            result = fut => result,
        };
        // 结果与取消同时就绪时以取消为准
        self.ensure_active()?;
        result
    }

    /// 步骤失败时发出failed事件覆盖running状态，取消不视为失败
    pub fn report_failure(&self, step_id: &str, kind: EventKind, title: &str, err: &ResearchError) {
        if err.is_cancelled() {
            return;
        }
        tracing::warn!(step_id, "research step failed: {}", err);
        self.emit(ProgressEvent::failed(step_id, kind, title, err.to_string()));
    }
}
