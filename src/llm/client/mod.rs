//! LLM客户端 - 基于rig extractor的结构化生成服务

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::future::Future;

use crate::config::LLMConfig;
use crate::llm::client::utils::evaluate_befitting_model;
use crate::research::generation::{
    GenerationError, GenerationRequest, StructuredGenerator,
};

mod providers;
pub mod utils;

use providers::ProviderClient;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, log_tag: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts;
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        task = log_tag,
                        attempt = retries,
                        max_attempts = max_retries,
                        error = %err,
                        "model call failed"
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 数据提取方法
    pub async fn extract<T>(&self, log_tag: &str, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        self.extract_inner(
            log_tag,
            system_prompt,
            user_prompt,
            befitting_model,
            fallover_model,
        )
        .await
    }

    async fn extract_inner<T>(
        &self,
        log_tag: &str,
        system_prompt: &str,
        user_prompt: &str,
        befitting_model: String,
        fallover_model: Option<String>,
    ) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor =
            self.client
                .create_extractor::<T>(&befitting_model, system_prompt, &self.config);

        let outcome = self
            .retry_with_backoff(log_tag, || async { extractor.extract(user_prompt).await })
            .await;

        match (outcome, fallover_model) {
            (Ok(result), _) => Ok(result),
            (Err(e), Some(model)) => {
                tracing::warn!(
                    task = log_tag,
                    model = %model,
                    error = %e,
                    "all attempts failed, switching to the fallover model"
                );
                let user_prompt_with_fixer = format!(
                    "{}\n\n**Note**: a previous attempt failed with the error \"{}\". Make sure this answer avoids it.",
                    user_prompt, e
                );
                Box::pin(self.extract_inner(
                    log_tag,
                    system_prompt,
                    &user_prompt_with_fixer,
                    model,
                    None,
                ))
                .await
            }
            (Err(e), None) => Err(e),
        }
    }
}

#[async_trait]
impl StructuredGenerator for LLMClient {
    async fn generate<T>(&self, request: GenerationRequest) -> Result<T, GenerationError>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static,
    {
        self.extract::<T>(
            request.task.as_str(),
            &request.system_prompt,
            &request.user_prompt,
        )
        .await
        .map_err(|e| GenerationError::Failed {
            task: request.task,
            cause: format!("{:#}", e),
        })
    }
}
