use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::i18n::TargetLanguage;

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
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 输出路径
    pub output_path: PathBuf,

    /// 请求未指定时使用的文章语言
    pub target_language: TargetLanguage,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 阶段调用器的超时与重试策略
    pub invoker: InvokerConfig,

    /// 编排器策略
    pub orchestrator: OrchestratorConfig,

    /// 所有流水线共享的外部调用限流
    pub rate_limit: RateLimitConfig,

    /// 风格缓存配置
    pub cache: CacheConfig,

    /// 查重门配置
    pub duplication: DuplicationConfig,

    /// 参考内容抓取配置
    pub fetch: FetchConfig,

    /// 记录存储配置
    pub record_store: RecordStoreConfig,

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

    /// LLM API基地址
    pub api_base_url: String,

    /// tier-1：高能效模型
    pub model_efficient: String,

    /// tier-2：均衡模型
    pub model_balanced: String,

    /// tier-3：高质量模型
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,
}

/// 阶段调用器配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct InvokerConfig {
    /// 瞬时错误的最大尝试次数（含首次）
    pub max_attempts: u32,

    /// 首次退避时长（毫秒）
    pub initial_backoff_ms: u64,

    /// 退避倍率
    pub backoff_multiplier: f64,

    /// 退避上限（毫秒）
    pub max_backoff_ms: u64,

    /// 输出结构不合法时的额外重试次数
    pub schema_retries: u32,

    /// 单次调用超时（毫秒）
    pub call_timeout_ms: u64,
}

/// 编排器配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// 调用器重试耗尽后，整个阶段的额外重试次数
    pub stage_retries: u32,
}

/// 限流配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// 同时在途的推理调用上限
    pub max_concurrent: usize,

    /// 每分钟推理调用上限，0表示不限制
    pub requests_per_minute: usize,
}

/// 风格缓存后端
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    Memory,
    #[default]
    File,
    RecordStore,
}

/// 缓存配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用缓存
    pub enabled: bool,

    /// 缓存后端
    pub backend: CacheBackend,

    /// 缓存目录
    pub cache_dir: PathBuf,

    /// 画像新鲜度窗口（小时），不配置则永久有效
    pub freshness_hours: Option<u64>,
}

/// 查重门配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DuplicationConfig {
    /// 本地预筛选的最低相似度
    pub min_similarity: f64,

    /// 作为重点候选交给Agent的条目数
    pub max_candidates: usize,

    /// 交给Agent的语料条目上限
    pub max_corpus_items: usize,

    /// 是否把历史生成记录的主题并入语料
    pub include_history: bool,
}

/// 参考内容抓取配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub enabled: bool,

    pub timeout_seconds: u64,

    /// 样本正文最大字节数
    pub max_bytes: usize,

    /// 允许访问内网地址，仅用于本地测试
    pub allow_private_hosts: bool,
}

/// 记录存储配置
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RecordStoreConfig {
    pub enabled: bool,

    /// JSON记录文件路径
    pub path: PathBuf,

    /// 每分钟读写上限
    pub requests_per_minute: usize,
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
        Ok(config)
    }
}

impl InvokerConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// 第`retry`次重试前的退避时长（从1开始计）
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let millis = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

impl CacheConfig {
    /// 新鲜度窗口；超出可表示范围的值按永久有效处理
    pub fn freshness(&self) -> Option<chrono::Duration> {
        self.freshness_hours
            .and_then(|hours| i64::try_from(hours).ok())
            .and_then(chrono::Duration::try_hours)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./blogsmith.out"),
            target_language: TargetLanguage::default(),
            llm: LLMConfig::default(),
            invoker: InvokerConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            duplication: DuplicationConfig::default(),
            fetch: FetchConfig::default(),
            record_store: RecordStoreConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("BLOGSMITH_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model_efficient: String::from("gpt-4o-mini"),
            model_balanced: String::from("gpt-4o"),
            model_powerful: String::from("gpt-4.1"),
            max_tokens: 16384,
            temperature: 0.7,
        }
    }
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 30_000,
            schema_retries: 1,
            call_timeout_ms: 120_000,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { stage_retries: 1 }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            requests_per_minute: 60,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            cache_dir: PathBuf::from(".blogsmith/cache"),
            freshness_hours: None,
        }
    }
}

impl Default for DuplicationConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.35,
            max_candidates: 5,
            max_corpus_items: 50,
            include_history: true,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: 20,
            max_bytes: 64 * 1024, // 64KB
            allow_private_hosts: false,
        }
    }
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(".blogsmith/records.json"),
            requests_per_minute: 60,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
