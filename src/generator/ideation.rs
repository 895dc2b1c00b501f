//! 选题生成：独立于文章流水线，只调用一次选题Agent

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::fetch::UrlGuard;
use crate::generator::context::GeneratorContext;
use crate::generator::invoker::{FailureKind, StageOutput};
use crate::generator::stages::{StageInput, StageKind, StagePayload, TopicIdeationInput};
use crate::i18n::TargetLanguage;
use crate::types::{ModelTier, SourceIdentity, TopicIdea};

/// 单次请求的选题数量上限
pub const MAX_TOPICS: usize = 20;
/// 交给Agent的关键词上限
const MAX_KEYWORDS: usize = 10;

/// 选题请求
#[derive(Debug, Clone, PartialEq)]
pub struct IdeationRequest {
    pub reference_source: String,
    pub num_topics: usize,
    pub desired_model: ModelTier,
    pub preferences: Option<String>,
    pub target_keywords: Vec<String>,
    pub product_urls: Vec<String>,
    pub existing_topics_to_avoid: Vec<String>,
    pub target_language: TargetLanguage,
}

impl IdeationRequest {
    pub fn new(reference_source: impl Into<String>, num_topics: usize) -> Self {
        Self {
            reference_source: reference_source.into(),
            num_topics,
            desired_model: ModelTier::default(),
            preferences: None,
            target_keywords: Vec::new(),
            product_urls: Vec::new(),
            existing_topics_to_avoid: Vec::new(),
            target_language: TargetLanguage::default(),
        }
    }
}

/// 选题结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeationResult {
    pub source_identity: SourceIdentity,
    pub ideas: Vec<TopicIdea>,
}

impl IdeationResult {
    pub fn to_markdown(&self) -> String {
        let mut markdown = format!("# Topic ideas for {}\n\n", self.source_identity.domain());
        for (index, idea) in self.ideas.iter().enumerate() {
            markdown.push_str(&format!("## {}. {}\n", index + 1, idea.title));
            markdown.push_str(&format!("- **Angle**: {}\n", idea.angle));
            markdown.push_str(&format!("- **Keywords**: {}\n", idea.keywords.join(", ")));
            markdown.push_str(&format!("- **Rationale**: {}\n", idea.rationale));
            markdown.push_str(&format!("- **Content Type**: {}\n\n", idea.content_type));
        }
        markdown
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdeationError {
    #[error("reference source rejected: {0}")]
    InvalidSource(String),
    #[error("topic ideation failed ({kind}): {detail}")]
    Failed { kind: FailureKind, detail: String },
    #[error("topic ideation cancelled")]
    Cancelled,
}

pub struct TopicIdeaGenerator {
    context: GeneratorContext,
}

impl TopicIdeaGenerator {
    pub fn new(context: GeneratorContext) -> Self {
        Self { context }
    }

    pub async fn generate(
        &self,
        request: &IdeationRequest,
        cancel: &CancellationToken,
    ) -> Result<IdeationResult, IdeationError> {
        let guard = UrlGuard::new(self.context.config.fetch.allow_private_hosts);
        let source = guard
            .check_source(&request.reference_source)
            .map_err(|e| IdeationError::InvalidSource(e.to_string()))?;

        let existing = self
            .context
            .existing_topics(&request.existing_topics_to_avoid)
            .await;
        let input = self.build_input(request, source.clone(), &existing);
        let num_topics = input.num_topics;
        tracing::info!("💡 为 {} 生成 {} 个选题", source, num_topics);

        let input = StageInput::TopicIdeation(input);
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(IdeationError::Cancelled),
            output = self.context.invoker.invoke(&input, request.desired_model) => output,
        };

        match output {
            StageOutput::Success(StagePayload::TopicIdeation(list)) => {
                let mut ideas = list.ideas;
                if ideas.len() > num_topics {
                    tracing::debug!("✂️ 返回 {} 个选题，截取前 {} 个", ideas.len(), num_topics);
                    ideas.truncate(num_topics);
                }
                Ok(IdeationResult {
                    source_identity: source,
                    ideas,
                })
            }
            StageOutput::Success(other) => Err(IdeationError::Failed {
                kind: FailureKind::SchemaInvalid,
                detail: format!(
                    "unexpected payload for stage {}: {}",
                    StageKind::TopicIdeation,
                    other.kind()
                ),
            }),
            StageOutput::Failure { kind, detail } => Err(IdeationError::Failed { kind, detail }),
        }
    }

    /// 规整数量、关键词与已有文章列表
    pub fn build_input(
        &self,
        request: &IdeationRequest,
        source: SourceIdentity,
        existing: &[String],
    ) -> TopicIdeationInput {
        let mut seen = BTreeSet::new();
        let mut existing_topics: Vec<String> = existing
            .iter()
            .map(|topic| topic.trim())
            .filter(|topic| !topic.is_empty())
            .filter(|topic| seen.insert(topic.to_lowercase()))
            .map(str::to_string)
            .collect();
        let limit = self.context.config.duplication.max_corpus_items;
        let omitted = existing_topics.len().saturating_sub(limit);
        existing_topics.truncate(limit);

        let target_keywords = request
            .target_keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect();

        TopicIdeationInput {
            source,
            num_topics: request.num_topics.clamp(1, MAX_TOPICS),
            preferences: request
                .preferences
                .clone()
                .filter(|preferences| !preferences.trim().is_empty()),
            target_keywords,
            product_urls: request.product_urls.clone(),
            existing_topics,
            omitted,
            target_language: request.target_language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use crate::config::Config;
    use crate::llm::capability::{CapabilityError, CapabilityRequest, ReasoningCapability};
    use crate::types::ContentType;

    struct IdeaCapability {
        count: usize,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReasoningCapability for IdeaCapability {
        async fn reason(&self, request: &CapabilityRequest) -> Result<Value, CapabilityError> {
            self.prompts.lock().unwrap().push(request.user_prompt.clone());
            let ideas: Vec<Value> = (1..=self.count)
                .map(|n| {
                    json!({
                        "title": format!("Idea {}", n),
                        "angle": "fresh angle",
                        "keywords": ["remote work"],
                        "rationale": "not covered yet",
                        "content_type": "listicle"
                    })
                })
                .collect();
            Ok(json!({ "ideas": ideas }))
        }
    }

    fn generator(count: usize) -> (TopicIdeaGenerator, Arc<IdeaCapability>) {
        let mut config = Config::default();
        config.fetch.enabled = false;
        config.record_store.enabled = false;
        config.cache.enabled = false;
        config.duplication.max_corpus_items = 2;
        config.rate_limit.requests_per_minute = 0;

        let capability = Arc::new(IdeaCapability {
            count,
            prompts: Mutex::new(Vec::new()),
        });
        let context = GeneratorContext::new(config, capability.clone()).unwrap();
        (TopicIdeaGenerator::new(context), capability)
    }

    #[test]
    fn test_build_input_caps_and_dedups() {
        let (generator, _) = generator(1);
        let mut request = IdeationRequest::new("example-blog.test", 0);
        request.target_keywords = (1..=12).map(|n| format!("kw{}", n)).collect();
        request.preferences = Some("   ".to_string());
        let existing = vec![
            "Remote work tips".to_string(),
            "remote work tips".to_string(),
            " ".to_string(),
            "Async standups".to_string(),
            "Meeting-free Fridays".to_string(),
        ];

        let source = SourceIdentity::parse("example-blog.test").unwrap();
        let input = generator.build_input(&request, source, &existing);

        assert_eq!(input.num_topics, 1);
        assert_eq!(input.target_keywords.len(), MAX_KEYWORDS);
        assert_eq!(input.preferences, None);
        assert_eq!(input.existing_topics, vec!["Remote work tips", "Async standups"]);
        assert_eq!(input.omitted, 1);

        request.num_topics = 500;
        let source = SourceIdentity::parse("example-blog.test").unwrap();
        assert_eq!(
            generator.build_input(&request, source, &[]).num_topics,
            MAX_TOPICS
        );
    }

    #[tokio::test]
    async fn test_generate_truncates_to_requested_count() {
        let (generator, capability) = generator(5);
        let mut request = IdeationRequest::new("https://example-blog.test", 3);
        request.existing_topics_to_avoid = vec!["Remote work tips".to_string()];

        let result = generator
            .generate(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.source_identity.domain(), "example-blog.test");
        assert_eq!(result.ideas.len(), 3);
        assert_eq!(result.ideas[0].content_type, ContentType::Listicle);
        let markdown = result.to_markdown();
        assert!(markdown.contains("## 3. Idea 3"));
        assert!(markdown.contains("- **Content Type**: Listicle"));
        let prompts = capability.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Remote work tips"));
    }

    #[tokio::test]
    async fn test_generate_rejects_internal_source_without_calls() {
        let (generator, capability) = generator(5);
        let request = IdeationRequest::new("http://10.0.0.8/", 3);

        let result = generator.generate(&request, &CancellationToken::new()).await;

        assert!(matches!(result, Err(IdeationError::InvalidSource(_))));
        assert!(capability.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_honors_cancellation() {
        let (generator, capability) = generator(5);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = generator
            .generate(&IdeationRequest::new("example-blog.test", 3), &cancel)
            .await;

        assert_eq!(result, Err(IdeationError::Cancelled));
        assert!(capability.prompts.lock().unwrap().is_empty());
    }
}
