use crate::generator::stages::{PromptSection, PromptTemplate, StageKind, StagePrompt};
use crate::i18n::TargetLanguage;
use crate::types::{LinkDensity, SourceIdentity};

/// 内链阶段的输入
#[derive(Debug, Clone)]
pub struct LinkingInput {
    pub topic: String,
    pub source: SourceIdentity,
    pub draft_body: String,
    pub link_density: LinkDensity,
    pub target_language: TargetLanguage,
}

impl StagePrompt for LinkingInput {
    fn kind(&self) -> StageKind {
        StageKind::Linking
    }

    fn prompt_template(&self) -> PromptTemplate {
        let (min, max) = self.link_density.link_range();
        PromptTemplate {
            system_prompt: "You add strategic internal links to blog posts. You only link to pages that \
really exist on the given site, and you never guess or construct URLs."
                .to_string(),
            opening_instruction: format!(
                "Add internal links to pages on {} that relate to this post about {}.",
                self.source.domain(),
                self.topic
            ),
            closing_instruction: format!(
                "Add {min}-{max} relevant links using natural anchor text in markdown form \
[anchor text](URL). Only link to pages on {domain}; if you cannot find a relevant page, leave the \
text unlinked. Do not change anything else and return the full post in `content`.",
                domain = self.source.domain()
            ),
        }
    }

    fn sections(&self) -> Vec<PromptSection> {
        vec![
            PromptSection::new("Website", self.source.url()),
            PromptSection::new("Blog post content", self.draft_body.clone()),
        ]
    }

    fn target_language(&self) -> Option<TargetLanguage> {
        Some(self.target_language)
    }
}
