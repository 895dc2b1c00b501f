use std::fmt::{Display, Formatter};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::i18n::TargetLanguage;

/// 推理能力档位
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelTier {
    /// 高能效档
    #[serde(rename = "tier-1")]
    Tier1,
    /// 均衡档
    #[serde(rename = "tier-2")]
    #[default]
    Tier2,
    /// 高质量档
    #[serde(rename = "tier-3")]
    Tier3,
}

impl Display for ModelTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelTier::Tier1 => write!(f, "tier-1"),
            ModelTier::Tier2 => write!(f, "tier-2"),
            ModelTier::Tier3 => write!(f, "tier-3"),
        }
    }
}

impl std::str::FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tier-1" | "tier1" | "1" | "efficient" => Ok(ModelTier::Tier1),
            "tier-2" | "tier2" | "2" | "balanced" => Ok(ModelTier::Tier2),
            "tier-3" | "tier3" | "3" | "powerful" => Ok(ModelTier::Tier3),
            _ => Err(format!("Unknown model tier: {}", s)),
        }
    }
}

/// 内链密度
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkDensity {
    Sparse,
    #[default]
    Normal,
    Dense,
}

impl LinkDensity {
    /// 期望插入的内链数量区间（含两端）
    pub fn link_range(&self) -> (u8, u8) {
        match self {
            LinkDensity::Sparse => (1, 2),
            LinkDensity::Normal => (2, 5),
            LinkDensity::Dense => (4, 8),
        }
    }
}

impl std::str::FromStr for LinkDensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sparse" | "low" => Ok(LinkDensity::Sparse),
            "normal" | "medium" => Ok(LinkDensity::Normal),
            "dense" | "high" => Ok(LinkDensity::Dense),
            _ => Err(format!("Unknown link density: {}", s)),
        }
    }
}

/// 请求的可选配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct RequestOptions {
    /// 目标字数
    #[serde(default)]
    pub word_count_target: Option<u32>,
    /// 覆盖参考站点的语气
    #[serde(default)]
    pub tone_override: Option<String>,
    #[serde(default)]
    pub link_density: LinkDensity,
    /// 额外写作要求（受众、结构、CTA等）
    #[serde(default)]
    pub writing_requirements: Option<String>,
    #[serde(default)]
    pub seo_keywords: Vec<String>,
    /// 风格分析时优先参考的高表现页面
    #[serde(default)]
    pub high_performing_pages: Vec<String>,
    /// 需要在文章中推广的产品页
    #[serde(default)]
    pub target_product_urls: Vec<String>,
    /// 需要避免重复的已有文章
    #[serde(default)]
    pub existing_posts_to_avoid: Vec<String>,
    /// 即使存在缓存也强制重新分析风格
    #[serde(default)]
    pub force_style_refresh: bool,
    #[serde(default)]
    pub target_language: TargetLanguage,
}

/// 请求标识
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 一次文章生成请求，提交后不可变
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineRequest {
    id: RequestId,
    topic: String,
    reference_source: String,
    desired_model: ModelTier,
    options: RequestOptions,
}

impl PipelineRequest {
    pub fn new(
        topic: impl Into<String>,
        reference_source: impl Into<String>,
        desired_model: ModelTier,
        options: RequestOptions,
    ) -> Self {
        Self {
            id: RequestId::new(),
            topic: topic.into(),
            reference_source: reference_source.into(),
            desired_model,
            options,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn reference_source(&self) -> &str {
        &self.reference_source
    }

    pub fn desired_model(&self) -> ModelTier {
        self.desired_model
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }
}

/// 参考来源解析错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("reference source is empty")]
    Empty,
    #[error("reference source `{0}` is not a valid URL: {1}")]
    Malformed(String, String),
    #[error("reference source `{0}` uses unsupported scheme `{1}`")]
    UnsupportedScheme(String, String),
    #[error("reference source `{0}` has no host")]
    MissingHost(String),
}

/// 参考来源的规范化身份（即缓存键）
///
/// 身份取自URL的主机名：小写、去掉`www.`前缀、忽略端口与路径。
/// 不带协议的输入（如`TechCrunch.com`）按https处理。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    domain: String,
    url: String,
}

impl SourceIdentity {
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SourceError::Empty);
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| SourceError::Malformed(trimmed.to_string(), e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SourceError::UnsupportedScheme(
                trimmed.to_string(),
                url.scheme().to_string(),
            ));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SourceError::MissingHost(trimmed.to_string()))?;

        let host = host.to_lowercase();
        let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();

        Ok(Self {
            domain,
            url: url.to_string(),
        })
    }

    /// 从记录存储中的域名字段恢复身份
    pub fn from_domain(domain: &str) -> Result<Self, SourceError> {
        Self::parse(domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn as_key(&self) -> &str {
        &self.domain
    }
}

impl Display for SourceIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_identity_normalizes_host() {
        let a = SourceIdentity::parse("https://example-blog.test").unwrap();
        let b = SourceIdentity::parse("example-blog.test").unwrap();
        let c = SourceIdentity::parse("HTTP://WWW.Example-Blog.test:8080/posts/1").unwrap();

        assert_eq!(a.domain(), "example-blog.test");
        assert_eq!(a.as_key(), b.as_key());
        assert_eq!(a.as_key(), c.as_key());
        assert_eq!(b.url(), "https://example-blog.test/");
    }

    #[test]
    fn test_source_identity_rejects_bad_input() {
        assert_eq!(SourceIdentity::parse("   "), Err(SourceError::Empty));
        assert!(matches!(
            SourceIdentity::parse("ftp://example.com"),
            Err(SourceError::UnsupportedScheme(_, _))
        ));
        assert!(matches!(
            SourceIdentity::parse("https://"),
            Err(SourceError::Malformed(_, _)) | Err(SourceError::MissingHost(_))
        ));
    }

    #[test]
    fn test_model_tier_parse_and_display() {
        assert_eq!("tier-2".parse::<ModelTier>().unwrap(), ModelTier::Tier2);
        assert_eq!("powerful".parse::<ModelTier>().unwrap(), ModelTier::Tier3);
        assert_eq!(ModelTier::Tier1.to_string(), "tier-1");
        assert!("tier-9".parse::<ModelTier>().is_err());

        let json = serde_json::to_string(&ModelTier::Tier2).unwrap();
        assert_eq!(json, "\"tier-2\"");
    }

    #[test]
    fn test_request_is_assigned_unique_ids() {
        let a = PipelineRequest::new("topic", "a.test", ModelTier::Tier1, RequestOptions::default());
        let b = PipelineRequest::new("topic", "a.test", ModelTier::Tier1, RequestOptions::default());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.topic(), "topic");
        assert_eq!(a.desired_model(), ModelTier::Tier1);
    }

    #[test]
    fn test_link_density_range() {
        assert_eq!(LinkDensity::default().link_range(), (2, 5));
        assert_eq!("dense".parse::<LinkDensity>().unwrap(), LinkDensity::Dense);
    }
}
