use crate::generator::stages::{
    PromptSection, PromptTemplate, StageKind, StagePrompt, StageSchema, bullet_list,
};
use crate::types::{ResearchBundle, StyleProfile};

/// 调研阶段的输入
#[derive(Debug, Clone)]
pub struct ResearchInput {
    pub topic: String,
    pub style: StyleProfile,
    pub writing_requirements: Option<String>,
    pub target_product_urls: Vec<String>,
    pub seo_keywords: Vec<String>,
    /// 查重门给出的差异化建议
    pub differentiation: Option<String>,
}

impl StagePrompt for ResearchInput {
    fn kind(&self) -> StageKind {
        StageKind::Research
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a research specialist for blog content. Find relevant facts, \
statistics and examples, identify key points and subtopics, and cite sources whenever possible."
                .to_string(),
            opening_instruction: format!("Research the topic: {}", self.topic),
            closing_instruction: "Focus on recent developments and trends, concrete facts and numbers, \
unique perspectives and practical, actionable information. Order facts by importance; put every \
source you relied on into citations."
                .to_string(),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        vec![
            PromptSection::new(
                "Audience and voice",
                format!("{} ({})", self.style.tone, self.style.source_identity.domain()),
            ),
            PromptSection::new(
                "Requirements",
                self.writing_requirements.clone().unwrap_or_default(),
            ),
            PromptSection::new(
                "Products or pages to promote",
                bullet_list(&self.target_product_urls),
            ),
            PromptSection::new("SEO keywords", bullet_list(&self.seo_keywords)),
            PromptSection::new(
                "Differentiate from existing content",
                self.differentiation.clone().unwrap_or_default(),
            ),
        ]
    }
}

impl StageSchema for ResearchBundle {
    fn check(&self) -> Result<(), String> {
        if self.facts.is_empty() {
            return Err("research produced no facts".to_string());
        }
        if self.facts.iter().any(|fact| fact.claim.trim().is_empty()) {
            return Err("research contains an empty claim".to_string());
        }
        Ok(())
    }
}
