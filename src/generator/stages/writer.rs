use crate::generator::stages::{
    PromptSection, PromptTemplate, StageKind, StagePrompt, StageSchema, bullet_list,
};
use crate::i18n::TargetLanguage;
use crate::types::{ArticleBody, ResearchBundle, StyleProfile};

/// 写作阶段的输入
#[derive(Debug, Clone)]
pub struct WritingInput {
    pub topic: String,
    pub style: StyleProfile,
    pub research: ResearchBundle,
    pub writing_requirements: Option<String>,
    pub word_count_target: Option<u32>,
    pub seo_keywords: Vec<String>,
    pub differentiation: Option<String>,
    pub target_language: TargetLanguage,
}

/// 把风格画像渲染为写手可读的风格指南
pub(crate) fn render_style_guide(style: &StyleProfile) -> String {
    format!(
        "Tone: {}\nHeadings: {}\nLists: {}\n\n{}",
        style.tone, style.heading_style, style.list_style, style.guide_text
    )
}

fn render_research(research: &ResearchBundle) -> String {
    let mut content = research
        .facts
        .iter()
        .enumerate()
        .map(|(idx, fact)| match &fact.source {
            Some(source) => format!("{}. {} (source: {})", idx + 1, fact.claim, source),
            None => format!("{}. {}", idx + 1, fact.claim),
        })
        .collect::<Vec<_>>()
        .join("\n");
    if !research.citations.is_empty() {
        content.push_str("\n\nCitations:\n");
        let citations: Vec<String> = research.citations.iter().cloned().collect();
        content.push_str(&bullet_list(&citations));
    }
    content
}

impl StagePrompt for WritingInput {
    fn kind(&self) -> StageKind {
        StageKind::Writing
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a skilled blog writer. You write engaging, well-structured posts \
with clear introductions and conclusions, and you imitate the voice and formatting of a reference \
publication closely."
                .to_string(),
            opening_instruction: format!("Write a blog post about: {}", self.topic),
            closing_instruction: format!(
                "Match the style and voice of {domain}: use the heading hierarchy, list preferences and \
emphasis patterns from the style guide, and build on the research data. Return the whole post as \
markdown in the `content` field.",
                domain = self.style.source_identity.domain()
            ),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        let length = self
            .word_count_target
            .map(|words| format!("About {} words.", words))
            .unwrap_or_default();
        vec![
            PromptSection::new("Style guide to follow", render_style_guide(&self.style)),
            PromptSection::new("Research data", render_research(&self.research)),
            PromptSection::new(
                "Requirements",
                self.writing_requirements.clone().unwrap_or_default(),
            ),
            PromptSection::new("Length", length),
            PromptSection::new("SEO keywords", bullet_list(&self.seo_keywords)),
            PromptSection::new(
                "Differentiate from existing content",
                self.differentiation.clone().unwrap_or_default(),
            ),
        ]
    }

    fn target_language(&self) -> Option<TargetLanguage> {
        Some(self.target_language)
    }
}

impl StageSchema for ArticleBody {
    fn check(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("article body is empty".to_string());
        }
        Ok(())
    }
}
