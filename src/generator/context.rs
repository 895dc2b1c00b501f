use std::sync::Arc;

use anyhow::Result;

use crate::cache::{CachePerformanceReport, StyleGuideCache, build_style_cache};
use crate::config::Config;
use crate::fetch::{HttpReferenceFetcher, ReferenceFetcher};
use crate::generator::invoker::AgentInvoker;
use crate::llm::capability::ReasoningCapability;
use crate::llm::limiter::RateLimiter;
use crate::store::{RecordStore, build_record_store};

/// 生成器上下文，持有流水线共享的依赖；克隆只复制`Arc`
#[derive(Clone)]
pub struct GeneratorContext {
    /// 配置
    pub config: Config,
    /// 推理能力
    pub capability: Arc<dyn ReasoningCapability>,
    /// 阶段调用器
    pub invoker: AgentInvoker,
    /// 风格缓存
    pub style_cache: Arc<dyn StyleGuideCache>,
    /// 记录存储，未启用时为None
    pub record_store: Option<Arc<dyn RecordStore>>,
    /// 参考内容抓取器，未启用时为None
    pub fetcher: Option<Arc<dyn ReferenceFetcher>>,
}

impl GeneratorContext {
    /// 按配置创建上下文
    pub fn new(config: Config, capability: Arc<dyn ReasoningCapability>) -> Result<Self> {
        let limiter = RateLimiter::new(&config.rate_limit);
        let invoker = AgentInvoker::new(capability.clone(), limiter, config.invoker.clone());
        let record_store = build_record_store(&config.record_store);
        let style_cache = build_style_cache(&config.cache, record_store.clone())?;
        let fetcher: Option<Arc<dyn ReferenceFetcher>> = if config.fetch.enabled {
            Some(Arc::new(HttpReferenceFetcher::new(&config.fetch)?))
        } else {
            None
        };

        Ok(Self {
            config,
            capability,
            invoker,
            style_cache,
            record_store,
            fetcher,
        })
    }

    pub fn with_style_cache(mut self, style_cache: Arc<dyn StyleGuideCache>) -> Self {
        self.style_cache = style_cache;
        self
    }

    pub fn with_record_store(mut self, record_store: Option<Arc<dyn RecordStore>>) -> Self {
        self.record_store = record_store;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Option<Arc<dyn ReferenceFetcher>>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// 与其他上下文共享同一个限流器
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.invoker = AgentInvoker::new(
            self.capability.clone(),
            limiter,
            self.config.invoker.clone(),
        );
        self
    }

    /// 获取缓存性能报告
    pub fn cache_report(&self) -> Option<CachePerformanceReport> {
        self.style_cache.performance()
    }

    /// 已有文章语料：调用方列出的文章，加上历史生成记录的主题
    pub async fn existing_topics(&self, requested: &[String]) -> Vec<String> {
        let mut corpus = requested.to_vec();

        if self.config.duplication.include_history {
            if let Some(store) = &self.record_store {
                match store.list_generated_content().await {
                    Ok(records) => corpus.extend(records.into_iter().map(|record| record.topic)),
                    Err(e) => tracing::warn!("⚠️ 读取生成历史失败，仅使用请求中的文章: {}", e),
                }
            }
        }
        corpus
    }
}
