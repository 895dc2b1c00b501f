use crate::generator::stages::{
    PromptSection, PromptTemplate, StageKind, StagePrompt, StageSchema, bullet_list,
};
use crate::types::{SourceIdentity, StyleAnalysisOutput};

/// 风格分析阶段的输入
#[derive(Debug, Clone)]
pub struct StyleAnalysisInput {
    pub source: SourceIdentity,
    /// 抓取到的参考站点纯文本样本
    pub sample: Option<String>,
    pub high_performing_pages: Vec<String>,
}

impl StagePrompt for StyleAnalysisInput {
    fn kind(&self) -> StageKind {
        StageKind::StyleAnalysis
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a writing style analyzer that can analyze any blog or publication. \
Extract measurable, replicable patterns: headline structure and length, opening hooks, voice and \
personality, technical depth and jargon, sentence rhythm, recurring phrases, paragraph organization, \
heading hierarchy, list usage and emphasis. Turn them into actionable guidelines a writer can follow."
                .to_string(),
            opening_instruction: format!(
                "Analyze the writing style of the publication at {} and produce a style guide.",
                self.source.url()
            ),
            closing_instruction: "Rate analysis_quality as `high` when the material was rich enough to \
support specific examples, `medium` when partial, and `low` when you had little or no real content \
to analyze."
                .to_string(),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        let sample = match &self.sample {
            Some(sample) => sample.clone(),
            None => format!(
                "No sample could be fetched. Rely on what you know about {}.",
                self.source.domain()
            ),
        };
        vec![
            PromptSection::new("Publication", self.source.domain()),
            PromptSection::new(
                "High-performing pages to prioritize",
                bullet_list(&self.high_performing_pages),
            ),
            PromptSection::new("Content sample", sample),
        ]
    }
}

impl StageSchema for StyleAnalysisOutput {
    fn check(&self) -> Result<(), String> {
        if self.guide_text.trim().is_empty() {
            return Err("style guide text is empty".to_string());
        }
        Ok(())
    }
}
