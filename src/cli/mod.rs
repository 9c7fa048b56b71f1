use crate::config::{Config, DEFAULT_CONFIG_FILE, LLMProvider};
use crate::research::types::ResearchDepth;
use crate::workflow::ResearchRequest;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// DeepResearch-RS - 由Rust与AI驱动的推理式研究引擎
#[derive(Parser, Debug)]
#[command(name = "deepresearch-rs")]
#[command(
    about = "Reasoned research engine: plans a topic with an LLM, searches the web, academic papers and social posts, reviews knowledge gaps and synthesizes the findings."
)]
#[command(version)]
pub struct Args {
    /// 研究主题
    #[arg(short, long)]
    pub topic: String,

    /// 研究深度 (basic, advanced)；advanced会针对知识缺口发起第二轮搜索
    #[arg(short, long)]
    pub depth: Option<ResearchDepth>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 以JSON Lines输出进度事件与最终结果
    #[arg(long)]
    pub json: bool,

    /// 高能效模型，用于常规的结构化生成
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长上下文生成，以及作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM Provider (openai, anthropic, deepseek, openrouter, ollama)
    #[arg(long)]
    pub llm_provider: Option<LLMProvider>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Tavily API KEY（网页搜索）
    #[arg(long)]
    pub tavily_api_key: Option<String>,

    /// Exa API KEY（学术与社交搜索）
    #[arg(long)]
    pub exa_api_key: Option<String>,

    /// 单次搜索调用的超时时间（秒）
    #[arg(long)]
    pub search_timeout: Option<u64>,
}

impl Args {
    /// 本次研究调用的请求参数
    pub fn research_request(&self) -> ResearchRequest {
        ResearchRequest {
            topic: self.topic.clone(),
            json_output: self.json,
        }
    }

    /// 将CLI参数转换为配置：配置文件 -> 默认配置文件 -> 默认值，再由命令行参数覆盖
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);

                if default_config_path.exists() {
                    Config::from_file(&default_config_path).with_context(|| {
                        format!("无法读取默认配置文件 {:?}", default_config_path)
                    })?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(depth) = self.depth {
            config.research.depth = depth;
        }

        // 覆盖LLM配置
        if let Some(provider) = self.llm_provider {
            config.llm.provider = provider;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 覆盖搜索配置
        if let Some(tavily_api_key) = self.tavily_api_key {
            config.search.tavily_api_key = tavily_api_key;
        }
        if let Some(exa_api_key) = self.exa_api_key {
            config.search.exa_api_key = exa_api_key;
        }
        if let Some(search_timeout) = self.search_timeout {
            config.search.timeout_seconds = search_timeout;
        }

        config.verbose = config.verbose || self.verbose;
        config.validate()?;

        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
