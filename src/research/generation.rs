//! 结构化生成服务 - 给定prompt与结果schema，返回符合schema的值

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// 生成任务类型，同时用作日志标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationTask {
    Plan,
    Analysis,
    GapReview,
    Synthesis,
}

impl GenerationTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationTask::Plan => "plan",
            GenerationTask::Analysis => "analysis",
            GenerationTask::GapReview => "gap-review",
            GenerationTask::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次结构化生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub task: GenerationTask,
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{task} generation failed: {cause}")]
    Failed { task: GenerationTask, cause: String },

    #[error("{task} generation returned an unusable result: {reason}")]
    Rejected { task: GenerationTask, reason: String },
}

impl GenerationError {
    pub fn task(&self) -> GenerationTask {
        match self {
            GenerationError::Failed { task, .. } | GenerationError::Rejected { task, .. } => *task,
        }
    }
}

/// 结构化生成服务，重试策略由实现方自行负责
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate<T>(&self, request: GenerationRequest) -> Result<T, GenerationError>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static;
}
