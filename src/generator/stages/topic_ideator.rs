use crate::generator::stages::{
    PromptSection, PromptTemplate, StageKind, StagePrompt, StageSchema, bullet_list,
};
use crate::i18n::TargetLanguage;
use crate::types::{SourceIdentity, TopicIdeaList};

/// 选题阶段的输入
#[derive(Debug, Clone)]
pub struct TopicIdeationInput {
    pub source: SourceIdentity,
    pub num_topics: usize,
    pub preferences: Option<String>,
    pub target_keywords: Vec<String>,
    pub product_urls: Vec<String>,
    /// 需要避开的已有文章
    pub existing_topics: Vec<String>,
    /// 因数量上限未列出的已有文章条数
    pub omitted: usize,
    pub target_language: TargetLanguage,
}

impl StagePrompt for TopicIdeationInput {
    fn kind(&self) -> StageKind {
        StageKind::TopicIdeation
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a content strategist specializing in blog topic ideation. You \
study a publication's content strategy and propose fresh topics that fit its voice, work the \
requested keywords in naturally and never repeat what the publication already covers."
                .to_string(),
            opening_instruction: format!(
                "Generate {} topic ideas for the blog {}.",
                self.num_topics,
                self.source.url()
            ),
            closing_instruction: format!(
                "Return exactly {} ideas. Each idea needs a compelling title, a one-sentence angle, \
a few target keywords, a one-sentence rationale and a content_type. Prefer topics built around the \
target keywords. When a product is listed, pick topics where it is a natural solution while the \
article still gives value on its own. Do NOT suggest anything close to the existing posts.",
                self.num_topics
            ),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        let mut existing = bullet_list(&self.existing_topics);
        if self.omitted > 0 {
            existing.push_str(&format!("\n(and {} more)", self.omitted));
        }

        vec![
            PromptSection::new(
                "Preferences",
                self.preferences
                    .clone()
                    .unwrap_or_else(|| "No specific preferences".to_string()),
            ),
            PromptSection::new("Target keywords", bullet_list(&self.target_keywords)),
            PromptSection::new("Product or service to promote", bullet_list(&self.product_urls)),
            PromptSection::new("Existing posts to avoid", existing),
        ]
    }

    fn target_language(&self) -> Option<TargetLanguage> {
        Some(self.target_language)
    }
}

impl StageSchema for TopicIdeaList {
    fn check(&self) -> Result<(), String> {
        if self.ideas.is_empty() {
            return Err("no topic ideas returned".to_string());
        }
        if let Some(position) = self.ideas.iter().position(|idea| idea.title.trim().is_empty()) {
            return Err(format!("topic idea {} has an empty title", position + 1));
        }
        Ok(())
    }
}
