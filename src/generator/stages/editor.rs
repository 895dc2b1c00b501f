use crate::generator::stages::writer::render_style_guide;
use crate::generator::stages::{
    PromptSection, PromptTemplate, StageKind, StagePrompt, bullet_list,
};
use crate::i18n::TargetLanguage;
use crate::types::StyleProfile;

/// 编辑阶段的输入
#[derive(Debug, Clone)]
pub struct EditingInput {
    pub style: StyleProfile,
    pub linked_body: String,
    pub seo_keywords: Vec<String>,
    pub target_language: TargetLanguage,
}

impl StagePrompt for EditingInput {
    fn kind(&self) -> StageKind {
        StageKind::Editing
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            system_prompt: "You are a content editor. You improve clarity, flow, grammar and readability \
while keeping a publication's distinctive voice intact."
                .to_string(),
            opening_instruction: format!(
                "Edit this blog post while preserving the {} style and its internal links.",
                self.style.source_identity.domain()
            ),
            closing_instruction: "Keep every [anchor text](URL) link exactly as it is and make the text \
flow naturally around it. Optimize headings and keyword placement only where it does not conflict \
with the style guide. Return the edited post as markdown in `content`."
                .to_string(),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        vec![
            PromptSection::new("Original style guide", render_style_guide(&self.style)),
            PromptSection::new("SEO keywords", bullet_list(&self.seo_keywords)),
            PromptSection::new("Draft to edit", self.linked_body.clone()),
        ]
    }

    fn target_language(&self) -> Option<TargetLanguage> {
        Some(self.target_language)
    }
}
