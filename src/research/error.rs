use thiserror::Error;

use crate::research::generation::GenerationError;
use crate::search::ProviderError;

/// 研究调用的错误分类
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("invalid research request: {0}")]
    InvalidInput(String),

    #[error("failed to generate a research plan: {0}")]
    PlanGeneration(#[source] GenerationError),

    #[error("search step `{step_id}` failed: {cause}")]
    SearchStep {
        step_id: String,
        #[source]
        cause: ProviderError,
    },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("research was cancelled")]
    Cancelled,
}

impl ResearchError {
    /// 搜索步骤失败时对应的provider错误
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            ResearchError::SearchStep { cause, .. } => Some(cause),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResearchError::Cancelled)
    }
}

/// 单条结果缺少必需标识（例如无法解析的社交帖子链接），只在本地丢弃该条结果
#[derive(Debug, Error)]
#[error("result `{url}` from step `{step_id}` has no {missing}")]
pub struct MalformedResultError {
    pub step_id: String,
    pub url: String,
    pub missing: &'static str,
}
