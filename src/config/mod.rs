use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::research::types::ResearchDepth;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "deepresearch.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl LLMProvider {
    /// 各provider官方API的基地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Anthropic => "https://api.anthropic.com",
            LLMProvider::DeepSeek => "https://api.deepseek.com",
            LLMProvider::OpenRouter => "https://openrouter.ai/api/v1",
            LLMProvider::Ollama => "http://localhost:11434",
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索服务配置
    pub search: SearchConfig,

    /// 研究编排配置
    pub research: ResearchConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址，留空时使用provider的默认地址
    pub api_base_url: String,

    /// 高能效模型，用于常规的结构化生成
    pub model_efficient: String,

    /// 高质量模型，用于长上下文的生成，以及作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
}

/// 搜索服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub tavily_api_key: String,

    pub tavily_base_url: String,

    pub exa_api_key: String,

    pub exa_base_url: String,

    /// 单次搜索调用的超时时间（秒）
    pub timeout_seconds: u64,

    /// 网页搜索排除的域名
    pub exclude_domains: Vec<String>,
}

/// 研究编排配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ResearchConfig {
    /// 默认研究深度
    pub depth: ResearchDepth,

    /// 网页与学术搜索每步最少返回条数
    pub min_results_per_step: usize,

    /// 每步最多返回条数
    pub max_results_per_step: usize,

    /// 写入prompt时单条结果内容的截断长度（字符）
    pub content_truncate_length: usize,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// 检查配置的取值范围
    pub fn validate(&self) -> Result<()> {
        let research = &self.research;
        ensure!(
            research.max_results_per_step > 0,
            "research.max_results_per_step must be greater than 0"
        );
        ensure!(
            research.min_results_per_step <= research.max_results_per_step,
            "research.min_results_per_step ({}) exceeds research.max_results_per_step ({})",
            research.min_results_per_step,
            research.max_results_per_step
        );
        ensure!(
            self.search.timeout_seconds > 0,
            "search.timeout_seconds must be greater than 0"
        );
        ensure!(
            self.llm.retry_attempts > 0,
            "llm.retry_attempts must be greater than 0"
        );
        Ok(())
    }
}

impl LLMConfig {
    /// 实际使用的API基地址
    pub fn resolved_base_url(&self) -> &str {
        let explicit = self.api_base_url.trim();
        if explicit.is_empty() {
            self.provider.default_base_url()
        } else {
            explicit
        }
    }

    /// 随每次结构化生成请求发送的额外参数
    pub fn generation_params(&self) -> serde_json::Value {
        serde_json::json!({ "temperature": self.temperature })
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("DEEPRESEARCH_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::new(),
            model_efficient: String::from("gpt-4o-mini"),
            model_powerful: String::from("gpt-4o"),
            max_tokens: 16384,
            temperature: 0.1,
            retry_attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: std::env::var("TAVILY_API_KEY").unwrap_or_default(),
            tavily_base_url: String::from("https://api.tavily.com"),
            exa_api_key: std::env::var("EXA_API_KEY").unwrap_or_default(),
            exa_base_url: String::from("https://api.exa.ai"),
            timeout_seconds: 30,
            exclude_domains: vec![],
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            depth: ResearchDepth::Basic,
            min_results_per_step: 1,
            max_results_per_step: 10,
            content_truncate_length: 1500,
        }
    }
}
