use crate::generator::stages::{
    PromptSection, PromptTemplate, StageKind, StagePrompt, StageSchema, bullet_list,
};
use crate::types::{SeoReport, SourceIdentity};
use crate::utils::text::word_count;

/// SEO分析阶段的输入
#[derive(Debug, Clone)]
pub struct SeoAnalysisInput {
    pub topic: String,
    pub source: SourceIdentity,
    pub edited_body: String,
    pub seo_keywords: Vec<String>,
}

impl StagePrompt for SeoAnalysisInput {
    fn kind(&self) -> StageKind {
        StageKind::SeoAnalysis
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are an SEO analyst. You score finished blog posts for search visibility \
and give specific, actionable recommendations."
                .to_string(),
            opening_instruction: format!(
                "Analyze this finished blog post about {} for SEO.",
                self.topic
            ),
            closing_instruction: "Score the post from 0 to 100. Give prioritized recommendations on \
heading structure and keywords, content gaps, internal linking, a meta description and \
readability. Report the word count of the post."
                .to_string(),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        vec![
            PromptSection::new("Publication", self.source.domain()),
            PromptSection::new("Target keywords", bullet_list(&self.seo_keywords)),
            PromptSection::new(
                "Measured word count",
                word_count(&self.edited_body).to_string(),
            ),
            PromptSection::new("Blog post", self.edited_body.clone()),
        ]
    }
}

impl StageSchema for SeoReport {
    fn check(&self) -> Result<(), String> {
        if !self.score.is_finite() || !(0.0..=100.0).contains(&self.score) {
            return Err(format!("seo score {} is outside 0-100", self.score));
        }
        Ok(())
    }
}
