use crate::config::{Config, LLMProvider};
use crate::generator::ideation::IdeationRequest;
use crate::i18n::TargetLanguage;
use crate::types::{LinkDensity, ModelTier, PipelineRequest, RequestOptions};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

/// blogsmith - 由Rust与AI驱动的风格化文章生成引擎
#[derive(Parser, Debug, Clone)]
#[command(name = "blogsmith")]
#[command(
    about = "AI-based article generation pipeline. It learns the writing style of a reference publication, checks the topic against existing posts, researches, writes, links, edits and scores a new article."
)]
#[command(version)]
pub struct Args {
    /// 文章主题，生成选题时可省略
    #[arg(short, long, required_unless_present = "ideas")]
    pub topic: Option<String>,

    /// 参考站点（URL或域名）
    #[arg(short, long)]
    pub reference: String,

    /// 只为参考站点生成指定数量的选题（1-20），不写文章
    #[arg(long, value_name = "N")]
    pub ideas: Option<usize>,

    /// 选题偏好（行业、读者、内容形式等）
    #[arg(long)]
    pub preferences: Option<String>,

    /// 模型档位 (tier-1, tier-2, tier-3 或 efficient, balanced, powerful)
    #[arg(short = 'm', long, default_value = "tier-2")]
    pub model_tier: String,

    /// 目标字数
    #[arg(long)]
    pub word_count: Option<u32>,

    /// 覆盖参考站点的语气
    #[arg(long)]
    pub tone: Option<String>,

    /// 内链密度 (sparse, normal, dense)
    #[arg(long)]
    pub link_density: Option<String>,

    /// 额外写作要求
    #[arg(long)]
    pub requirements: Option<String>,

    /// SEO关键词，可重复
    #[arg(short = 'k', long = "keyword")]
    pub keywords: Vec<String>,

    /// 风格分析时优先参考的页面，可重复
    #[arg(long = "high-performing-page")]
    pub high_performing_pages: Vec<String>,

    /// 需要推广的产品页，可重复
    #[arg(long = "product-url")]
    pub product_urls: Vec<String>,

    /// 需要避免重复的已有文章标题，可重复
    #[arg(long = "avoid")]
    pub avoid: Vec<String>,

    /// 即使有缓存也重新分析风格
    #[arg(long)]
    pub force_refresh: bool,

    /// 目标语言 (en, zh, ja, ko, de, fr, es)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// LLM Provider (openai, anthropic, deepseek, openrouter, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// tier-1使用的模型
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// tier-2使用的模型
    #[arg(long)]
    pub model_balanced: Option<String>,

    /// tier-3使用的模型
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 同时在途的推理调用上限
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// 是否禁用风格缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 加载配置文件并应用CLI参数覆盖
    pub fn to_config(&self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {}", config_path.display()))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("blogsmith.toml");

            if default_config_path.exists() {
                Config::from_file(&default_config_path).with_context(|| {
                    format!("无法读取默认配置文件 {}", default_config_path.display())
                })?
            } else {
                Config::default()
            }
        };

        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用配置中的provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(model_efficient) = &self.model_efficient {
            config.llm.model_efficient = model_efficient.clone();
        }
        if let Some(model_balanced) = &self.model_balanced {
            config.llm.model_balanced = model_balanced.clone();
        }
        if let Some(model_powerful) = &self.model_powerful {
            config.llm.model_powerful = model_powerful.clone();
        }
        if let Some(max_concurrent) = self.max_concurrent {
            config.rate_limit.max_concurrent = max_concurrent;
        }

        // 目标语言配置
        if let Some(target_language_str) = &self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的目标语言: {}，使用配置中的语言",
                    target_language_str
                );
            }
        }

        if self.no_cache {
            config.cache.enabled = false;
        }
        config.verbose = self.verbose;

        Ok(config)
    }

    fn tier(&self) -> Result<ModelTier> {
        self.model_tier
            .parse::<ModelTier>()
            .map_err(|e| anyhow!(e))
    }

    /// 构建生成请求
    pub fn to_request(&self, config: &Config) -> Result<PipelineRequest> {
        let topic = self
            .topic
            .clone()
            .ok_or_else(|| anyhow!("--topic is required to generate an article"))?;
        let tier = self.tier()?;
        let link_density = match &self.link_density {
            Some(density) => density.parse::<LinkDensity>().map_err(|e| anyhow!(e))?,
            None => LinkDensity::default(),
        };

        let options = RequestOptions {
            word_count_target: self.word_count,
            tone_override: self.tone.clone(),
            link_density,
            writing_requirements: self.requirements.clone(),
            seo_keywords: self.keywords.clone(),
            high_performing_pages: self.high_performing_pages.clone(),
            target_product_urls: self.product_urls.clone(),
            existing_posts_to_avoid: self.avoid.clone(),
            force_style_refresh: self.force_refresh,
            target_language: config.target_language,
        };

        Ok(PipelineRequest::new(
            topic,
            self.reference.clone(),
            tier,
            options,
        ))
    }

    /// 构建选题请求，`--ideas`未指定时返回None
    pub fn to_ideation_request(&self, config: &Config) -> Result<Option<IdeationRequest>> {
        let Some(num_topics) = self.ideas else {
            return Ok(None);
        };

        let mut request = IdeationRequest::new(self.reference.clone(), num_topics);
        request.desired_model = self.tier()?;
        request.preferences = self.preferences.clone();
        request.target_keywords = self.keywords.clone();
        request.product_urls = self.product_urls.clone();
        request.existing_topics_to_avoid = self.avoid.clone();
        request.target_language = config.target_language;
        Ok(Some(request))
    }
}

// Include tests
#[cfg(test)]
mod tests;
